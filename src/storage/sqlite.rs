//! SQLite database wrapper.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::Result;
use crate::storage::migrations;

/// SQLite database for the state registry, Q-table, rankings and the
/// audit log. The connection is mutex-guarded so `Database` can be shared
/// across the parallel ranking loop.
pub struct Database {
    conn: Mutex<Connection>,
    schema_version: u32,
}

impl Database {
    /// Open (and migrate) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            schema_version,
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            schema_version,
        })
    }

    /// Run a closure with the locked connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Current schema version after migrations.
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }
}
