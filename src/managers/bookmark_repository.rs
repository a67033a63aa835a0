//! Repository over the single persisted bookmark mapping.
//!
//! Every write replaces the whole mapping under one key. There is no locking
//! between read and write: two mutations issued back to back without waiting
//! can race and the last write wins.

use tracing::debug;

use crate::database::kv_store::KeyValueStore;
use crate::types::bookmark::{BookmarkMap, BookmarkRecord, ConversationId};
use crate::types::errors::StoreError;

/// Get/Set/Delete access to the bookmark mapping.
pub trait BookmarkRepository {
    fn load_all(&self) -> Result<BookmarkMap, StoreError>;
    fn save_all(&self, map: &BookmarkMap) -> Result<(), StoreError>;
    /// Drops the entire mapping.
    fn clear(&self) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<BookmarkRecord>, StoreError> {
        Ok(self.load_all()?.get(id).cloned())
    }

    fn put(&self, id: &ConversationId, record: BookmarkRecord) -> Result<(), StoreError> {
        let mut map = self.load_all()?;
        map.insert(id, record);
        self.save_all(&map)
    }

    /// Deletes `id`; returns whether a bookmarked record was present.
    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut map = self.load_all()?;
        let removed = map.remove(id);
        self.save_all(&map)?;
        Ok(removed)
    }
}

/// [`BookmarkRepository`] storing the mapping as JSON under one key.
#[derive(Debug, Clone)]
pub struct KvBookmarkRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KvBookmarkRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: KeyValueStore> BookmarkRepository for KvBookmarkRepository<S> {
    fn load_all(&self) -> Result<BookmarkMap, StoreError> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BookmarkMap::new()),
        }
    }

    fn save_all(&self, map: &BookmarkMap) -> Result<(), StoreError> {
        let raw = serde_json::to_string(map)?;
        debug!(key = %self.key, bookmarks = map.bookmarked_count(), "saving bookmark mapping");
        self.store.set(&self.key, &raw)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}
