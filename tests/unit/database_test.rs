//! Unit tests for the SideMarks database layer (connection, migrations and
//! the key-value stores).

use sidemarks::database::kv_store::{KeyValueStore, MemoryKvStore, SqliteKvStore};
use sidemarks::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use sidemarks::database::Database;
use sidemarks::types::errors::StoreError;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_kv_table() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let exists: bool = db
        .connection()
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='kv_store'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);
    assert!(exists, "Table 'kv_store' should exist after migrations");
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    run_all(db.connection()).expect("second run should succeed");
    run_all(db.connection()).expect("third run should succeed");

    let rows: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
}

#[test]
fn test_sqlite_store_set_get_remove() {
    let store = SqliteKvStore::new(Database::open_in_memory().unwrap());
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "{\"a\":1}").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("{\"a\":1}"));

    store.set("k", "{}").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("{}"));

    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
    // Removing a missing key is not an error.
    store.remove("k").unwrap();
}

#[test]
fn test_sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sidemarks.db");

    {
        let store = SqliteKvStore::new(Database::open(&path).unwrap());
        store.set("bookmarks", "{\"abc\":false}").unwrap();
    }

    let store = SqliteKvStore::new(Database::open(&path).unwrap());
    assert_eq!(store.get("bookmarks").unwrap().as_deref(), Some("{\"abc\":false}"));
}

#[test]
fn test_memory_store_clones_share_data() {
    let a = MemoryKvStore::new();
    let b = a.clone();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
    b.remove("k").unwrap();
    assert_eq!(a.get("k").unwrap(), None);
}

#[test]
fn test_memory_store_unavailable_fails_every_call() {
    let store = MemoryKvStore::new();
    store.set("k", "v").unwrap();
    store.set_available(false);

    assert!(matches!(store.get("k"), Err(StoreError::Unavailable(_))));
    assert!(matches!(store.set("k", "w"), Err(StoreError::Unavailable(_))));
    assert!(matches!(store.remove("k"), Err(StoreError::Unavailable(_))));

    store.set_available(true);
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
}
