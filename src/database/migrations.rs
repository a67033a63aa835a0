//! Versioned schema for the SideMarks SQLite file.
//!
//! Applied versions are recorded in `schema_version`; [`run_all`] applies the
//! missing ones in order, each inside its own transaction.

use rusqlite::{params, Connection};

/// One schema step.
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Key-value store for extension state",
    sql: "CREATE TABLE IF NOT EXISTS kv_store (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at INTEGER NOT NULL
          );",
}];

/// Highest version [`run_all`] brings a database to.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Version recorded in the database, 0 for a fresh file.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Applies every pending migration. Running it again is a no-op.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description)
             VALUES (?1, strftime('%s', 'now'), ?2)",
            params![migration.version, migration.description],
        )?;
        tx.commit()?;
        tracing::debug!(version = migration.version, "applied schema migration");
    }
    Ok(())
}
