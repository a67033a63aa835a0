//! Bookmark Manager for SideMarks.
//!
//! Implements `BookmarkManagerTrait`: the four store operations (toggle, set
//! color, remove, clear) against a [`BookmarkRepository`]. Each operation
//! reads the whole mapping, mutates it and writes it back. Keeping the page's
//! markers in step is the caller's job.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use super::bookmark_repository::BookmarkRepository;
use crate::types::bookmark::{BookmarkMap, BookmarkRecord, ConversationId, DEFAULT_TYPE};
use crate::types::errors::BookmarkError;
use crate::types::platform::Platform;

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Added(BookmarkRecord),
    Removed,
}

/// Result of applying a color.
#[derive(Debug, Clone, PartialEq)]
pub enum SetColorOutcome {
    Created(BookmarkRecord),
    /// An existing bookmark switched to a different color.
    Updated(BookmarkRecord),
    /// The same color was applied twice, which removes the bookmark.
    Removed,
}

/// Trait defining bookmark store operations.
///
/// `title_of` captures the conversation's current display text; it is only
/// called when a record is about to be written.
pub trait BookmarkManagerTrait {
    fn toggle(
        &mut self,
        url: &str,
        platform: Platform,
        default_color: &str,
        title_of: &dyn Fn(&ConversationId) -> String,
    ) -> Result<(ConversationId, ToggleOutcome), BookmarkError>;
    fn set_color(
        &mut self,
        url: &str,
        color: &str,
        color_type: &str,
        platform: Platform,
        title_of: &dyn Fn(&ConversationId) -> String,
    ) -> Result<(ConversationId, SetColorOutcome), BookmarkError>;
    fn remove(&mut self, conversation_id: &str) -> Result<bool, BookmarkError>;
    fn clear_all(&mut self) -> Result<(), BookmarkError>;
    fn list(&self) -> Result<BookmarkMap, BookmarkError>;
}

/// Bookmark manager over a borrowed repository.
pub struct BookmarkManager<'a, R: BookmarkRepository> {
    repo: &'a R,
}

impl<'a, R: BookmarkRepository> BookmarkManager<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Returns the current UNIX timestamp in milliseconds.
    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn resolve(url: &str, platform: Platform) -> Result<ConversationId, BookmarkError> {
        if !platform.is_supported() {
            return Err(BookmarkError::UnsupportedPlatform(url.to_string()));
        }
        platform
            .conversation_id(url)
            .ok_or_else(|| BookmarkError::NoConversationId(url.to_string()))
    }

    fn new_record(
        id: &ConversationId,
        color: &str,
        color_type: &str,
        platform: Platform,
        title_of: &dyn Fn(&ConversationId) -> String,
    ) -> BookmarkRecord {
        BookmarkRecord {
            color: color.to_string(),
            color_type: color_type.to_string(),
            title: title_of(id),
            platform: Some(platform),
            timestamp: Self::now_millis(),
        }
    }
}

impl<'a, R: BookmarkRepository> BookmarkManagerTrait for BookmarkManager<'a, R> {
    /// Removes any existing record (whatever its color), otherwise creates a
    /// default-color record.
    fn toggle(
        &mut self,
        url: &str,
        platform: Platform,
        default_color: &str,
        title_of: &dyn Fn(&ConversationId) -> String,
    ) -> Result<(ConversationId, ToggleOutcome), BookmarkError> {
        let id = Self::resolve(url, platform)?;
        let mut map = self.repo.load_all()?;

        let outcome = if map.record(id.as_str()).is_some() {
            map.remove(id.as_str());
            info!(conversation = %id, "removed bookmark");
            ToggleOutcome::Removed
        } else {
            let record = Self::new_record(&id, default_color, DEFAULT_TYPE, platform, title_of);
            map.insert(&id, record.clone());
            info!(conversation = %id, %platform, "added toggle bookmark");
            ToggleOutcome::Added(record)
        };

        self.repo.save_all(&map)?;
        Ok((id, outcome))
    }

    /// Same color twice removes the bookmark; any other color creates or
    /// overwrites it with a fresh title, platform and timestamp.
    fn set_color(
        &mut self,
        url: &str,
        color: &str,
        color_type: &str,
        platform: Platform,
        title_of: &dyn Fn(&ConversationId) -> String,
    ) -> Result<(ConversationId, SetColorOutcome), BookmarkError> {
        let id = Self::resolve(url, platform)?;
        let mut map = self.repo.load_all()?;

        let outcome = match map.get(id.as_str()) {
            Some(existing) if existing.color == color => {
                map.remove(id.as_str());
                info!(conversation = %id, color, "same color applied twice, removed bookmark");
                SetColorOutcome::Removed
            }
            existing => {
                let was_bookmarked = existing.is_some();
                let record = Self::new_record(&id, color, color_type, platform, title_of);
                map.insert(&id, record.clone());
                info!(conversation = %id, %platform, color, "stored color bookmark");
                if was_bookmarked {
                    SetColorOutcome::Updated(record)
                } else {
                    SetColorOutcome::Created(record)
                }
            }
        };

        self.repo.save_all(&map)?;
        Ok((id, outcome))
    }

    fn remove(&mut self, conversation_id: &str) -> Result<bool, BookmarkError> {
        let removed = self.repo.delete(conversation_id)?;
        info!(conversation = conversation_id, removed, "remove bookmark");
        Ok(removed)
    }

    fn clear_all(&mut self) -> Result<(), BookmarkError> {
        self.repo.clear()?;
        info!("cleared all bookmarks");
        Ok(())
    }

    fn list(&self) -> Result<BookmarkMap, BookmarkError> {
        Ok(self.repo.load_all()?)
    }
}
