//! Crate-wide error taxonomy.
//!
//! Per-supplier conditions (metrics fetch, persistence) are recoverable:
//! the orchestrator logs an event and continues the batch. Nothing in the
//! ranking core is treated as globally fatal.

use thiserror::Error;

pub type Result<T, E = RanqError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RanqError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("metrics unavailable for supplier {supplier_id}: {reason}")]
    MetricsUnavailable { supplier_id: i64, reason: String },

    #[error("persistence failure for supplier {supplier_id}: {reason}")]
    Persistence { supplier_id: i64, reason: String },

    #[error("unknown state key: {0}")]
    UnknownState(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("supplier directory error: {0}")]
    Directory(String),
}

impl From<serde_json::Error> for RanqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
