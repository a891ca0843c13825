//! SQLite persistence layer.

mod migrations;
mod sqlite;
mod stores;

pub use migrations::SCHEMA_VERSION;
pub use sqlite::Database;
pub use stores::{SqliteEventSink, SqliteRankingStore, load_q_table, load_states, save_q_table, save_states};
