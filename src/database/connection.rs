//! The SQLite file standing in for the browser's local storage area.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use super::migrations;

/// Another host process may hold the write lock briefly.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// A migrated connection. Not `Sync`; wrap it in a store that serializes access.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the file at `path` and brings its schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::migrated(conn)
    }

    /// Private in-memory database, used by tests and the demo.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
