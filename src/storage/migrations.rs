//! Versioned schema migrations, tracked via `PRAGMA user_version`.

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

/// Apply any pending migrations; returns the resulting schema version.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current < 1 {
        migrate_v1(conn)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(SCHEMA_VERSION)
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS states (
            state_key   TEXT PRIMARY KEY,
            quality     INTEGER NOT NULL,
            delivery    INTEGER NOT NULL,
            price       INTEGER NOT NULL,
            service     INTEGER NOT NULL,
            description TEXT NOT NULL,
            first_seen  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS q_table (
            state_key    TEXT NOT NULL,
            action       TEXT NOT NULL,
            q_value      REAL NOT NULL DEFAULT 0.0,
            update_count INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL,
            PRIMARY KEY (state_key, action)
        );

        CREATE TABLE IF NOT EXISTS supplier_rankings (
            supplier_id    INTEGER NOT NULL,
            date           TEXT NOT NULL,
            supplier_name  TEXT NOT NULL,
            quality_score  REAL NOT NULL,
            delivery_score REAL NOT NULL,
            price_score    REAL NOT NULL,
            service_score  REAL NOT NULL,
            overall_score  REAL NOT NULL,
            rank_position  INTEGER NOT NULL,
            state_key      TEXT NOT NULL,
            notes          TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (supplier_id, date)
        );

        CREATE TABLE IF NOT EXISTS ranking_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type  TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            supplier_id INTEGER,
            state_key   TEXT,
            action      TEXT,
            reward      REAL,
            metadata    TEXT NOT NULL DEFAULT 'null'
        );

        CREATE INDEX IF NOT EXISTS idx_rankings_date
            ON supplier_rankings(date);
        CREATE INDEX IF NOT EXISTS idx_events_type
            ON ranking_events(event_type);
        CREATE INDEX IF NOT EXISTS idx_events_supplier
            ON ranking_events(supplier_id);",
    )?;
    Ok(())
}
