//! Supported chat platforms and their per-platform behavior.
//!
//! Every platform-specific decision (which hosts, which link selector, where
//! the title text lives, how much padding the marker needs) is data on a
//! [`PlatformProfile`], looked up from the closed [`Platform`] enum.

use serde::{Deserialize, Serialize};
use url::Url;

use super::bookmark::ConversationId;

/// A chat web application whose sidebar can carry bookmark markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    ChatGpt,
    Claude,
    Grok,
    #[serde(other)]
    Unknown,
}

/// Where the visible title text of a conversation link lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleLocator {
    /// The link element itself holds the text.
    Link,
    /// First nested `span`, falling back to the link.
    FirstSpanOrLink,
    /// First nested `.truncate`, falling back to the last-child `span`.
    TruncateOrLastSpan,
}

/// Static description of one supported platform.
#[derive(Debug)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// Hostname substrings that identify the platform.
    pub hosts: &'static [&'static str],
    /// Path segment that precedes a conversation id (`/c/`, `/chat/`).
    pub path_marker: &'static str,
    /// Domain used when rebuilding a conversation URL.
    pub domain: &'static str,
    pub display_name: &'static str,
    pub title_locator: TitleLocator,
    /// `left` offset of the marker inside the title container.
    pub marker_left: &'static str,
    /// `padding-left` applied to the title container while a marker is shown.
    pub padding_left: &'static str,
    /// Whether the sidebar renders late enough that startup needs a burst
    /// of delayed reconciles instead of a single immediate one.
    pub deferred_startup: bool,
}

const CHATGPT: PlatformProfile = PlatformProfile {
    platform: Platform::ChatGpt,
    hosts: &["chat.openai.com", "chatgpt.com"],
    path_marker: "/c/",
    domain: "chat.openai.com",
    display_name: "ChatGPT",
    title_locator: TitleLocator::TruncateOrLastSpan,
    marker_left: "0px",
    padding_left: "19px",
    deferred_startup: false,
};

const CLAUDE: PlatformProfile = PlatformProfile {
    platform: Platform::Claude,
    hosts: &["claude.ai"],
    path_marker: "/chat/",
    domain: "claude.ai",
    display_name: "Claude",
    title_locator: TitleLocator::Link,
    marker_left: "7px",
    padding_left: "32px",
    deferred_startup: true,
};

const GROK: PlatformProfile = PlatformProfile {
    platform: Platform::Grok,
    hosts: &["grok.com"],
    path_marker: "/chat/",
    domain: "grok.com",
    display_name: "Grok",
    title_locator: TitleLocator::FirstSpanOrLink,
    marker_left: "0px",
    padding_left: "20px",
    deferred_startup: true,
};

/// Resolution order: the first profile whose host pattern matches wins.
const RESOLUTION_ORDER: [&PlatformProfile; 3] = [&CLAUDE, &GROK, &CHATGPT];

/// Path markers of every supported platform, used when a DOM change has to be
/// classified before the platform is known.
pub const CONVERSATION_PATH_MARKERS: [&str; 2] = ["/c/", "/chat/"];

impl Platform {
    /// Fixed display order of the list viewer.
    pub const DISPLAY_ORDER: [Platform; 3] = [Platform::ChatGpt, Platform::Claude, Platform::Grok];

    /// Resolves the platform from a page location (full URL).
    ///
    /// Locations that do not parse as URLs resolve to `Unknown`.
    pub fn from_location(location: &str) -> Platform {
        match Url::parse(location) {
            Ok(url) => url
                .host_str()
                .map(Platform::from_hostname)
                .unwrap_or(Platform::Unknown),
            Err(_) => Platform::Unknown,
        }
    }

    /// Resolves the platform by substring match on a hostname.
    pub fn from_hostname(hostname: &str) -> Platform {
        let host = hostname.to_ascii_lowercase();
        RESOLUTION_ORDER
            .iter()
            .find(|p| p.hosts.iter().any(|h| host.contains(h)))
            .map(|p| p.platform)
            .unwrap_or(Platform::Unknown)
    }

    /// Returns the strategy table entry, or `None` for `Unknown`.
    pub fn profile(self) -> Option<&'static PlatformProfile> {
        match self {
            Platform::ChatGpt => Some(&CHATGPT),
            Platform::Claude => Some(&CLAUDE),
            Platform::Grok => Some(&GROK),
            Platform::Unknown => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self.profile().is_some()
    }

    /// Wire name as stored in bookmark records.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Claude => "claude",
            Platform::Grok => "grok",
            Platform::Unknown => "unknown",
        }
    }

    pub fn display_name(self) -> &'static str {
        self.profile().map(|p| p.display_name).unwrap_or("unknown")
    }

    /// Extracts the conversation id following the platform's path marker.
    ///
    /// The id is the longest run of ASCII alphanumerics and hyphens right after
    /// the first marker occurrence that has one. Sidebar links and the current
    /// location go through this same function so both resolve to one key.
    pub fn conversation_id(self, url: &str) -> Option<ConversationId> {
        let marker = self.profile()?.path_marker;
        url.match_indices(marker).find_map(|(start, _)| {
            let id: String = url[start + marker.len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                .collect();
            ConversationId::new(id)
        })
    }

    /// Rebuilds `https://<domain>/<marker>/<id>`. `Unknown` falls back to ChatGPT.
    pub fn conversation_url(self, id: &ConversationId) -> String {
        let profile = self.profile().unwrap_or(&CHATGPT);
        format!("https://{}{}{}", profile.domain, profile.path_marker, id)
    }

    /// Guesses a platform for records stored without one: hyphenated ids
    /// are UUID-shaped (Claude), anything else is treated as ChatGPT.
    pub fn guess_from_id(id: &str) -> Platform {
        if id.contains('-') {
            Platform::Claude
        } else {
            Platform::ChatGpt
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
