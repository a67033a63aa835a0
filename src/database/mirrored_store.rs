//! Synchronous view over an asynchronous storage area.
//!
//! The browser's extension storage (`chrome.storage.local`) is the one area
//! shared by every tab and the popup, but it only answers through promises.
//! [`MirroredStore`] keeps a hydrated copy of the keys the page uses, serves
//! [`KeyValueStore`] calls from that copy and queues writes until
//! [`MirroredStore::flush`] hands them to the backing area.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, warn};

use super::kv_store::{KeyValueStore, MemoryKvStore};
use crate::types::errors::StoreError;

/// A storage area whose operations complete later. Single-threaded.
#[allow(async_fn_in_trait)]
pub trait AsyncKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl AsyncKeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        KeyValueStore::get(self, key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        KeyValueStore::set(self, key, value)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        KeyValueStore::remove(self, key)
    }
}

struct Mirror<A> {
    backend: A,
    values: RefCell<HashMap<String, String>>,
    /// Latest unsent write per key; `None` removes the key.
    pending: RefCell<BTreeMap<String, Option<String>>>,
}

/// Write-through cache over an [`AsyncKeyValueStore`]. Clones share the cache.
pub struct MirroredStore<A> {
    inner: Rc<Mirror<A>>,
}

impl<A> Clone for MirroredStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: AsyncKeyValueStore> MirroredStore<A> {
    /// Reads `keys` from `backend` once. Reads of other keys see nothing.
    pub async fn hydrate(backend: A, keys: &[&str]) -> Result<Self, StoreError> {
        let mut values = HashMap::new();
        for key in keys {
            if let Some(value) = backend.get(key).await? {
                values.insert(key.to_string(), value);
            }
        }
        debug!(keys = keys.len(), present = values.len(), "storage mirror hydrated");
        Ok(Self {
            inner: Rc::new(Mirror {
                backend,
                values: RefCell::new(values),
                pending: RefCell::new(BTreeMap::new()),
            }),
        })
    }

    pub fn backend(&self) -> &A {
        &self.inner.backend
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }

    /// Applies a change made by another tab or the popup. A pending local
    /// write to the same key is kept and wins when flushed.
    pub fn apply_external(&self, key: &str, value: Option<String>) {
        if self.inner.pending.borrow().contains_key(key) {
            debug!(key, "external change shadowed by a pending write");
            return;
        }
        let mut values = self.inner.values.borrow_mut();
        match value {
            Some(value) => values.insert(key.to_string(), value),
            None => values.remove(key),
        };
    }

    /// Sends every queued write to the backend in key order. On failure the
    /// unsent writes stay queued unless newer ones replaced them meanwhile.
    pub async fn flush(&self) -> Result<usize, StoreError> {
        let mut queued = std::mem::take(&mut *self.inner.pending.borrow_mut()).into_iter();
        let mut sent = 0;
        while let Some((key, value)) = queued.next() {
            let result = match &value {
                Some(v) => self.inner.backend.set(&key, v).await,
                None => self.inner.backend.remove(&key).await,
            };
            if let Err(e) = result {
                warn!(key = %key, error = %e, "storage write failed");
                let mut pending = self.inner.pending.borrow_mut();
                for (key, value) in std::iter::once((key, value)).chain(queued) {
                    pending.entry(key).or_insert(value);
                }
                return Err(e);
            }
            sent += 1;
        }
        Ok(sent)
    }
}

impl<A: AsyncKeyValueStore> KeyValueStore for MirroredStore<A> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.inner
            .pending
            .borrow_mut()
            .insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.values.borrow_mut().remove(key);
        self.inner.pending.borrow_mut().insert(key.to_string(), None);
        Ok(())
    }
}
