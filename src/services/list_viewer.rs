//! List viewer: the popup's searchable, platform-grouped bookmark list.
//!
//! Built purely from the persisted mapping; it never looks at a page.

use std::fmt::Write as _;

use super::reconciler::marker_background;
use crate::types::bookmark::{BookmarkMap, ConversationId};
use crate::types::platform::Platform;

/// One bookmark as listed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub conversation_id: String,
    pub title: String,
    pub platform: Platform,
    pub color: String,
    /// Background CSS of the row's color swatch.
    pub swatch: String,
    /// Conversation URL opened when the row is selected.
    pub url: String,
    pub timestamp: i64,
}

impl ListRow {
    /// Case-insensitive substring match on title and platform display name.
    /// `term` must already be lowercase.
    fn matches(&self, term: &str) -> bool {
        term.is_empty()
            || self.title.to_lowercase().contains(term)
            || self.platform.display_name().to_lowercase().contains(term)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGroup {
    pub platform: Platform,
    pub rows: Vec<ListRow>,
}

impl PlatformGroup {
    pub fn header(&self) -> &'static str {
        self.platform.display_name()
    }
}

/// Snapshot of the mapping, grouped for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView {
    count: usize,
    groups: Vec<PlatformGroup>,
}

impl ListView {
    /// Rows are ordered oldest first by `timestamp`, then by id. A recolor
    /// refreshes the timestamp and so moves its row to the end of the group.
    pub fn from_bookmarks(bookmarks: &BookmarkMap) -> Self {
        let mut groups: Vec<PlatformGroup> = Platform::DISPLAY_ORDER
            .iter()
            .map(|p| PlatformGroup {
                platform: *p,
                rows: Vec::new(),
            })
            .collect();

        let mut count = 0;
        for (id, record) in bookmarks.bookmarked() {
            count += 1;
            let platform = record.platform_or_guess(id);
            let Some(group) = groups.iter_mut().find(|g| g.platform == platform) else {
                continue;
            };
            let Some(conversation) = ConversationId::new(id) else {
                continue;
            };
            let title = if record.title.trim().is_empty() {
                conversation.fallback_title()
            } else {
                record.title.clone()
            };
            group.rows.push(ListRow {
                conversation_id: id.to_string(),
                title,
                platform,
                color: record.color.clone(),
                swatch: marker_background(&record.color),
                url: platform.conversation_url(&conversation),
                timestamp: record.timestamp,
            });
        }

        for group in &mut groups {
            group
                .rows
                .sort_by(|a, b| (a.timestamp, &a.conversation_id).cmp(&(b.timestamp, &b.conversation_id)));
        }
        groups.retain(|g| !g.rows.is_empty());

        Self { count, groups }
    }

    /// Number of bookmarked records, including ones no group can show.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The list and the search box are only shown when something is bookmarked.
    pub fn shows_list(&self) -> bool {
        self.count > 0
    }

    pub fn shows_search(&self) -> bool {
        self.count > 0
    }

    pub fn groups(&self) -> &[PlatformGroup] {
        &self.groups
    }

    /// URL to open in a new tab when the row for `conversation_id` is selected.
    pub fn url_for(&self, conversation_id: &str) -> Option<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .find(|r| r.conversation_id == conversation_id)
            .map(|r| r.url.as_str())
    }

    /// Applies a search term. Whitespace around the term is ignored.
    pub fn filter(&self, query: &str) -> FilteredView {
        let term = query.trim().to_lowercase();
        let groups: Vec<PlatformGroup> = self
            .groups
            .iter()
            .map(|g| PlatformGroup {
                platform: g.platform,
                rows: g.rows.iter().filter(|r| r.matches(&term)).cloned().collect(),
            })
            .filter(|g| !g.rows.is_empty())
            .collect();
        FilteredView {
            count: self.count,
            term,
            groups,
        }
    }
}

/// The list as displayed for one search term.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    count: usize,
    term: String,
    groups: Vec<PlatformGroup>,
}

impl FilteredView {
    /// Groups with at least one visible row.
    pub fn groups(&self) -> &[PlatformGroup] {
        &self.groups
    }

    pub fn visible_rows(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn no_results_message(&self) -> Option<String> {
        if self.visible_rows() == 0 && !self.term.is_empty() {
            Some(format!("No bookmarks found for \"{}\"", self.term))
        } else {
            None
        }
    }

    /// Plain-text rendering, one header line per group and one line per row.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Bookmarks: {}", self.count);
        for group in &self.groups {
            let _ = writeln!(out, "{}", group.header());
            for row in &group.rows {
                let _ = writeln!(out, "  [{}] {}  {}", row.color, row.title, row.url);
            }
        }
        if let Some(message) = self.no_results_message() {
            let _ = writeln!(out, "{}", message);
        }
        out
    }
}
