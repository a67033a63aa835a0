//! SideMarks persistence layer.
//!
//! The extension keeps all of its state under one key of a local key-value
//! store. [`kv_store::KeyValueStore`] is that store; on native targets it is
//! backed by SQLite. In the browser it is a [`mirrored_store::MirroredStore`]
//! over the extension storage area shared by all tabs (see `crate::web`).
//!
//! ```no_run
//! use sidemarks::database::Database;
//! use sidemarks::database::kv_store::{KeyValueStore, SqliteKvStore};
//!
//! let store = SqliteKvStore::new(Database::open("sidemarks.db").expect("open"));
//! store.set("greeting", "{}").expect("write");
//! ```

#[cfg(not(target_arch = "wasm32"))]
pub mod connection;
pub mod kv_store;
#[cfg(not(target_arch = "wasm32"))]
pub mod migrations;
pub mod mirrored_store;

#[cfg(not(target_arch = "wasm32"))]
pub use connection::Database;
