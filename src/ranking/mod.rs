//! Ranking records, audit events and persistence interfaces.

mod orchestrator;

pub use orchestrator::RankingEngine;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::Result;
use crate::state::StateKey;

/// One supplier's ranking for one calendar day. Keyed by
/// `(supplier_id, date)` with upsert semantics: re-running ranking the
/// same day overwrites the prior record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRanking {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub date: NaiveDate,
    pub quality_score: f64,
    pub delivery_score: f64,
    pub price_score: f64,
    pub service_score: f64,
    pub overall_score: f64,
    pub rank: u32,
    pub state_key: StateKey,
    pub notes: String,
}

/// Audit event kinds written at major lifecycle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RankingStarted,
    RankingCompleted,
    DataFetched,
    ActionChosen,
    TrainingStarted,
    TrainingCompleted,
    QTableReset,
    Warning,
    Error,
}

impl EventType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RankingStarted => "RANKING_STARTED",
            Self::RankingCompleted => "RANKING_COMPLETED",
            Self::DataFetched => "DATA_FETCHED",
            Self::ActionChosen => "ACTION_CHOSEN",
            Self::TrainingStarted => "TRAINING_STARTED",
            Self::TrainingCompleted => "TRAINING_COMPLETED",
            Self::QTableReset => "QTABLE_RESET",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::RankingStarted,
            Self::RankingCompleted,
            Self::DataFetched,
            Self::ActionChosen,
            Self::TrainingStarted,
            Self::TrainingCompleted,
            Self::QTableReset,
            Self::Warning,
            Self::Error,
        ]
        .into_iter()
        .find(|t| t.as_str() == raw)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit log entry. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEvent {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub supplier_id: Option<i64>,
    pub state_key: Option<StateKey>,
    pub action: Option<Action>,
    pub reward: Option<f64>,
    pub metadata: serde_json::Value,
}

impl RankingEvent {
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            supplier_id: None,
            state_key: None,
            action: None,
            reward: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn supplier(mut self, supplier_id: i64) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    #[must_use]
    pub fn state(mut self, state_key: StateKey) -> Self {
        self.state_key = Some(state_key);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn reward(mut self, reward: f64) -> Self {
        self.reward = Some(reward);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Persistence collaborator for ranking rows.
pub trait RankingStore: Send + Sync {
    fn upsert(&self, ranking: &SupplierRanking) -> Result<()>;
    fn latest_for(&self, date: NaiveDate) -> Result<Vec<SupplierRanking>>;
}

/// Audit log collaborator.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &RankingEvent) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_round_trip() {
        for raw in ["RANKING_STARTED", "ACTION_CHOSEN", "ERROR", "QTABLE_RESET"] {
            assert_eq!(EventType::parse(raw).unwrap().as_str(), raw);
        }
        assert!(EventType::parse("RECOMMENDATION_MADE").is_none());
    }

    #[test]
    fn event_builder_sets_fields() {
        let event = RankingEvent::new(EventType::ActionChosen)
            .supplier(42)
            .state(StateKey::new(1, 2, 3, 4))
            .action(Action::FlagForAudit)
            .reward(6.5);
        assert_eq!(event.supplier_id, Some(42));
        assert_eq!(event.action, Some(Action::FlagForAudit));
        assert!(event.metadata.is_null());
    }
}
