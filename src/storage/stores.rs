//! SQLite implementations of the persistence collaborators, plus
//! load/flush helpers for the Q-table and state registry.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use crate::action::Action;
use crate::error::{RanqError, Result};
use crate::qtable::{QTable, QTableRow};
use crate::ranking::{EventSink, RankingEvent, RankingStore, SupplierRanking};
use crate::state::{State, StateKey, StateRegistry};
use crate::storage::Database;

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// =============================================================================
// RANKING STORE
// =============================================================================

pub struct SqliteRankingStore {
    db: Arc<Database>,
}

impl SqliteRankingStore {
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl RankingStore for SqliteRankingStore {
    fn upsert(&self, ranking: &SupplierRanking) -> Result<()> {
        self.db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO supplier_rankings
                        (supplier_id, date, supplier_name, quality_score, delivery_score,
                         price_score, service_score, overall_score, rank_position,
                         state_key, notes)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT(supplier_id, date) DO UPDATE SET
                        supplier_name = excluded.supplier_name,
                        quality_score = excluded.quality_score,
                        delivery_score = excluded.delivery_score,
                        price_score = excluded.price_score,
                        service_score = excluded.service_score,
                        overall_score = excluded.overall_score,
                        rank_position = excluded.rank_position,
                        state_key = excluded.state_key,
                        notes = excluded.notes",
                    params![
                        ranking.supplier_id,
                        ranking.date.to_string(),
                        ranking.supplier_name,
                        ranking.quality_score,
                        ranking.delivery_score,
                        ranking.price_score,
                        ranking.service_score,
                        ranking.overall_score,
                        ranking.rank,
                        ranking.state_key.to_string(),
                        ranking.notes,
                    ],
                )?;
                Ok(())
            })
            .map_err(|err| RanqError::Persistence {
                supplier_id: ranking.supplier_id,
                reason: err.to_string(),
            })
    }

    fn latest_for(&self, date: NaiveDate) -> Result<Vec<SupplierRanking>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT supplier_id, date, supplier_name, quality_score, delivery_score,
                        price_score, service_score, overall_score, rank_position,
                        state_key, notes
                 FROM supplier_rankings
                 WHERE date = ?1
                 ORDER BY rank_position ASC, supplier_id ASC",
            )?;
            let rows = stmt.query_map([date.to_string()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                    row.get::<_, u32>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                ))
            })?;

            let mut rankings = Vec::new();
            for row in rows {
                let (
                    supplier_id,
                    date_raw,
                    supplier_name,
                    quality_score,
                    delivery_score,
                    price_score,
                    service_score,
                    overall_score,
                    rank,
                    state_raw,
                    notes,
                ) = row?;
                rankings.push(SupplierRanking {
                    supplier_id,
                    supplier_name,
                    date: date_raw
                        .parse()
                        .map_err(|_| RanqError::Serialization(format!("bad date: {date_raw}")))?,
                    quality_score,
                    delivery_score,
                    price_score,
                    service_score,
                    overall_score,
                    rank,
                    state_key: StateKey::parse(&state_raw)?,
                    notes,
                });
            }
            Ok(rankings)
        })
    }
}

// =============================================================================
// EVENT SINK
// =============================================================================

pub struct SqliteEventSink {
    db: Arc<Database>,
}

impl SqliteEventSink {
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Count of recorded events, optionally filtered by type name.
    pub fn count(&self, event_type: Option<&str>) -> Result<i64> {
        self.db.with_conn(|conn| {
            let count = match event_type {
                Some(name) => conn.query_row(
                    "SELECT COUNT(*) FROM ranking_events WHERE event_type = ?1",
                    [name],
                    |row| row.get(0),
                )?,
                None => {
                    conn.query_row("SELECT COUNT(*) FROM ranking_events", [], |row| row.get(0))?
                }
            };
            Ok(count)
        })
    }
}

impl EventSink for SqliteEventSink {
    fn record(&self, event: &RankingEvent) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ranking_events
                    (event_type, timestamp, supplier_id, state_key, action, reward, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.event_type.as_str(),
                    event.timestamp.to_rfc3339(),
                    event.supplier_id,
                    event.state_key.map(|s| s.to_string()),
                    event.action.map(Action::name),
                    event.reward,
                    serde_json::to_string(&event.metadata)?,
                ],
            )?;
            Ok(())
        })
    }
}

// =============================================================================
// Q-TABLE AND STATE REGISTRY PERSISTENCE
// =============================================================================

/// Load all persisted Q-table rows. Rows with unparseable keys are
/// skipped rather than failing the load.
pub fn load_q_table(db: &Database) -> Result<Vec<QTableRow>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT state_key, action, q_value, update_count, last_updated FROM q_table",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)? as u64,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (state_raw, action_raw, q_value, update_count, updated_raw) = row?;
            let (Ok(state), Ok(action)) =
                (StateKey::parse(&state_raw), Action::parse(&action_raw))
            else {
                tracing::warn!(state_raw, action_raw, "skipping unparseable q_table row");
                continue;
            };
            out.push(QTableRow {
                state,
                action,
                q_value,
                update_count,
                last_updated: parse_timestamp(&updated_raw),
            });
        }
        Ok(out)
    })
}

/// Flush the full Q-table. Upserts every in-memory entry; rows are never
/// deleted, matching the append-only registry semantics.
pub fn save_q_table(db: &Database, table: &QTable) -> Result<()> {
    let rows = table.export(None);
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "INSERT INTO q_table (state_key, action, q_value, update_count, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(state_key, action) DO UPDATE SET
                q_value = excluded.q_value,
                update_count = excluded.update_count,
                last_updated = excluded.last_updated",
        )?;
        for row in &rows {
            stmt.execute(params![
                row.state.to_string(),
                row.action.name(),
                row.q_value,
                row.update_count as i64,
                row.last_updated.to_rfc3339(),
            ])?;
        }
        Ok(())
    })
}

/// Load the persisted state registry rows.
pub fn load_states(db: &Database) -> Result<Vec<State>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT state_key, description, first_seen FROM states")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (key_raw, description, seen_raw) = row?;
            let Ok(key) = StateKey::parse(&key_raw) else {
                tracing::warn!(key_raw, "skipping unparseable state row");
                continue;
            };
            out.push(State {
                key,
                description,
                first_seen: parse_timestamp(&seen_raw),
            });
        }
        Ok(out)
    })
}

/// Flush the state registry (insert-if-absent; the registry never shrinks).
pub fn save_states(db: &Database, registry: &StateRegistry) -> Result<()> {
    let states = registry.snapshot();
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO states
                (state_key, quality, delivery, price, service, description, first_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for state in &states {
            stmt.execute(params![
                state.key.to_string(),
                state.key.quality,
                state.key.delivery,
                state.key.price,
                state.key.service,
                state.description,
                state.first_seen.to_rfc3339(),
            ])?;
        }
        Ok(())
    })
}
