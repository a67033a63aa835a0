use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::platform::Platform;

/// Color used by the plain toggle action.
pub const DEFAULT_COLOR: &str = "#007aff";
/// `type` stored for bookmarks created by the plain toggle action.
pub const DEFAULT_TYPE: &str = "default";

/// Platform-specific trailing URL segment naming one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wraps a non-empty id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title shown when no sidebar text could be captured.
    pub fn fallback_title(&self) -> String {
        let short: String = self.0.chars().take(8).collect();
        format!("Conversation {}...", short)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed bookmark palette offered by the color menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookmarkColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

impl BookmarkColor {
    pub const ALL: [BookmarkColor; 7] = [
        BookmarkColor::Red,
        BookmarkColor::Orange,
        BookmarkColor::Yellow,
        BookmarkColor::Green,
        BookmarkColor::Blue,
        BookmarkColor::Purple,
        BookmarkColor::Gray,
    ];

    /// Menu/message action id, also stored as the record `type`.
    pub fn action_id(self) -> &'static str {
        match self {
            BookmarkColor::Red => "chatgpt-red",
            BookmarkColor::Orange => "chatgpt-orange",
            BookmarkColor::Yellow => "chatgpt-yellow",
            BookmarkColor::Green => "chatgpt-green",
            BookmarkColor::Blue => "chatgpt-blue",
            BookmarkColor::Purple => "chatgpt-purple",
            BookmarkColor::Gray => "chatgpt-gray",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            BookmarkColor::Red => "#ff3b30",
            BookmarkColor::Orange => "#ff9500",
            BookmarkColor::Yellow => "#ffcc00",
            BookmarkColor::Green => "#34c759",
            BookmarkColor::Blue => "#007aff",
            BookmarkColor::Purple => "#5856d6",
            BookmarkColor::Gray => "#8e8e93",
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            BookmarkColor::Red => "🔴 Red",
            BookmarkColor::Orange => "🟠 Orange",
            BookmarkColor::Yellow => "🟡 Yellow",
            BookmarkColor::Green => "🟢 Green",
            BookmarkColor::Blue => "🔵 Blue",
            BookmarkColor::Purple => "🟣 Purple",
            BookmarkColor::Gray => "⚫ Gray",
        }
    }

    pub fn from_action_id(id: &str) -> Option<BookmarkColor> {
        Self::ALL.into_iter().find(|c| c.action_id() == id)
    }
}

/// A persisted bookmark for one conversation.
///
/// Other writers share the mapping, so every field decodes leniently: a field
/// of the wrong shape falls back to its default instead of rejecting the
/// whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: String,
    #[serde(rename = "type", default = "default_type", deserialize_with = "lenient_type")]
    pub color_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Platform the bookmark was set on. Older records carry none.
    #[serde(
        default,
        deserialize_with = "lenient_platform",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<Platform>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

/// `null` and non-string values read as empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => default_type(),
    })
}

fn lenient_platform<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Platform>, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// JavaScript writers may store `Date.now()` as a float.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        _ => 0,
    })
}

impl BookmarkRecord {
    /// A record with an empty color counts as "not bookmarked".
    pub fn is_bookmarked(&self) -> bool {
        !self.color.is_empty()
    }

    /// Stored platform, or a guess from the id shape for older records.
    pub fn platform_or_guess(&self, id: &str) -> Platform {
        self.platform.unwrap_or_else(|| Platform::guess_from_id(id))
    }
}

/// One value in the persisted mapping: a record, the `false` tombstone, or
/// anything else a foreign writer left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Record(BookmarkRecord),
    Tombstone(bool),
    Unrecognized(serde_json::Value),
}

/// The full persisted mapping `conversation_id -> record`.
///
/// Tombstones and colorless records are kept as read so a round trip does not
/// rewrite data this version does not own, but every accessor treats them as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkMap {
    entries: BTreeMap<String, StoredEntry>,
}

impl BookmarkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `id` if it is bookmarked.
    pub fn get(&self, id: &str) -> Option<&BookmarkRecord> {
        match self.entries.get(id) {
            Some(StoredEntry::Record(r)) if r.is_bookmarked() => Some(r),
            _ => None,
        }
    }

    /// Returns the raw record for `id`, even when it carries no color.
    pub fn record(&self, id: &str) -> Option<&BookmarkRecord> {
        match self.entries.get(id) {
            Some(StoredEntry::Record(r)) => Some(r),
            _ => None,
        }
    }

    pub fn insert(&mut self, id: &ConversationId, record: BookmarkRecord) {
        self.entries
            .insert(id.as_str().to_string(), StoredEntry::Record(record));
    }

    /// Removes `id`; returns whether a bookmarked record was present.
    pub fn remove(&mut self, id: &str) -> bool {
        matches!(
            self.entries.remove(id),
            Some(StoredEntry::Record(r)) if r.is_bookmarked()
        )
    }

    /// Iterates bookmarked records in key order.
    pub fn bookmarked(&self) -> impl Iterator<Item = (&str, &BookmarkRecord)> {
        self.entries.iter().filter_map(|(id, entry)| match entry {
            StoredEntry::Record(r) if r.is_bookmarked() => Some((id.as_str(), r)),
            _ => None,
        })
    }

    pub fn bookmarked_count(&self) -> usize {
        self.bookmarked().count()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarked_count() == 0
    }
}
