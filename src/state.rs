//! State discretization and the state registry.
//!
//! A state is a 4-tuple of performance levels (quality, delivery, price,
//! service), each in 1..=5, giving exactly 625 possible identities with
//! canonical keys `Q{q}_D{d}_P{p}_S{s}`. Discretization is a pure function
//! of the metrics vector; the registry records states lazily on first
//! observation and never shrinks.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{RanqError, Result};
use crate::metrics::MetricsVector;

/// Ascending threshold ladder for quality, price and service (0-10 scores).
pub const SCORE_THRESHOLDS: [f64; 4] = [3.0, 5.0, 7.0, 9.0];
/// Ascending threshold ladder for the on-time delivery percentage.
pub const DELIVERY_THRESHOLDS: [f64; 4] = [70.0, 80.0, 90.0, 95.0];

/// Number of distinct state identities (5^4).
pub const STATE_SPACE_SIZE: usize = 625;

/// Discretized 4-dimensional performance category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StateKey {
    pub quality: u8,
    pub delivery: u8,
    pub price: u8,
    pub service: u8,
}

impl StateKey {
    /// Build a key, clamping each level into 1..=5.
    #[must_use]
    pub fn new(quality: u8, delivery: u8, price: u8, service: u8) -> Self {
        Self {
            quality: quality.clamp(1, 5),
            delivery: delivery.clamp(1, 5),
            price: price.clamp(1, 5),
            service: service.clamp(1, 5),
        }
    }

    /// Parse a canonical key such as `Q5_D4_P3_S2`.
    pub fn parse(raw: &str) -> Result<Self> {
        let err = || RanqError::UnknownState(raw.to_string());
        let mut levels = [0u8; 4];
        let parts: Vec<&str> = raw.split('_').collect();
        if parts.len() != 4 {
            return Err(err());
        }
        for (slot, (part, prefix)) in levels
            .iter_mut()
            .zip(parts.iter().zip(['Q', 'D', 'P', 'S']))
        {
            let rest = part.strip_prefix(prefix).ok_or_else(err)?;
            let level: u8 = rest.parse().map_err(|_| err())?;
            if !(1..=5).contains(&level) {
                return Err(err());
            }
            *slot = level;
        }
        Ok(Self {
            quality: levels[0],
            delivery: levels[1],
            price: levels[2],
            service: levels[3],
        })
    }

    #[must_use]
    pub fn levels(&self) -> [u8; 4] {
        [self.quality, self.delivery, self.price, self.service]
    }

    /// Mean of the four levels.
    #[must_use]
    pub fn average(&self) -> f64 {
        f64::from(
            u16::from(self.quality)
                + u16::from(self.delivery)
                + u16::from(self.price)
                + u16::from(self.service),
        ) / 4.0
    }

    /// Population variance of the four levels.
    #[must_use]
    pub fn variance(&self) -> f64 {
        let avg = self.average();
        self.levels()
            .iter()
            .map(|&l| (f64::from(l) - avg).powi(2))
            .sum::<f64>()
            / 4.0
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "Quality: {}/5, Delivery: {}/5, Price: {}/5, Service: {}/5",
            self.quality, self.delivery, self.price, self.service
        )
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q{}_D{}_P{}_S{}",
            self.quality, self.delivery, self.price, self.service
        )
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for StateKey {
    type Error = RanqError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

/// A registered state with its human-readable description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub key: StateKey,
    pub description: String,
    pub first_seen: DateTime<Utc>,
}

// =============================================================================
// STATE MAPPER
// =============================================================================

/// Maps a metrics vector onto a discrete state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMapper;

impl StateMapper {
    /// Monotonic step categorization: count of thresholds met, plus one,
    /// capped at 5.
    #[must_use]
    pub fn categorize(value: f64, thresholds: &[f64; 4]) -> u8 {
        let mut level = 1;
        for (i, threshold) in thresholds.iter().enumerate() {
            if value >= *threshold {
                level = u8::try_from(i).unwrap_or(0) + 2;
            } else {
                break;
            }
        }
        level
    }

    /// Pure discretization; never fails. Missing inputs default to
    /// mid-range values before categorization.
    #[must_use]
    pub fn discretize(metrics: &MetricsVector) -> StateKey {
        StateKey::new(
            Self::categorize(metrics.quality_score(), &SCORE_THRESHOLDS),
            Self::categorize(metrics.delivery_pct(), &DELIVERY_THRESHOLDS),
            Self::categorize(metrics.price_score(), &SCORE_THRESHOLDS),
            Self::categorize(metrics.service_score(), &SCORE_THRESHOLDS),
        )
    }

    /// Enumerate all 625 possible state keys.
    #[must_use]
    pub fn all_possible_states() -> Vec<StateKey> {
        let mut keys = Vec::with_capacity(STATE_SPACE_SIZE);
        for q in 1..=5 {
            for d in 1..=5 {
                for p in 1..=5 {
                    for s in 1..=5 {
                        keys.push(StateKey::new(q, d, p, s));
                    }
                }
            }
        }
        keys
    }
}

// =============================================================================
// STATE REGISTRY
// =============================================================================

/// Append-only registry of observed states. Insert-if-absent is
/// idempotent; the registry never shrinks.
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: RwLock<BTreeMap<StateKey, State>>,
}

impl StateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state on first observation; later calls return the
    /// existing record.
    pub fn get_or_create(&self, key: StateKey) -> State {
        if let Some(state) = self.states.read().get(&key) {
            return state.clone();
        }
        let mut states = self.states.write();
        states
            .entry(key)
            .or_insert_with(|| State {
                key,
                description: key.description(),
                first_seen: Utc::now(),
            })
            .clone()
    }

    #[must_use]
    pub fn contains(&self, key: StateKey) -> bool {
        self.states.read().contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<State> {
        self.states.read().values().cloned().collect()
    }

    /// Seed the registry from persisted rows.
    pub fn load(&self, states: impl IntoIterator<Item = State>) {
        let mut map = self.states.write();
        for state in states {
            map.entry(state.key).or_insert(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_follows_threshold_ladder() {
        assert_eq!(StateMapper::categorize(0.0, &SCORE_THRESHOLDS), 1);
        assert_eq!(StateMapper::categorize(2.9, &SCORE_THRESHOLDS), 1);
        assert_eq!(StateMapper::categorize(3.0, &SCORE_THRESHOLDS), 2);
        assert_eq!(StateMapper::categorize(5.0, &SCORE_THRESHOLDS), 3);
        assert_eq!(StateMapper::categorize(7.0, &SCORE_THRESHOLDS), 4);
        assert_eq!(StateMapper::categorize(9.0, &SCORE_THRESHOLDS), 5);
        assert_eq!(StateMapper::categorize(10.0, &SCORE_THRESHOLDS), 5);
        assert_eq!(StateMapper::categorize(94.9, &DELIVERY_THRESHOLDS), 4);
        assert_eq!(StateMapper::categorize(95.0, &DELIVERY_THRESHOLDS), 5);
    }

    #[test]
    fn discretize_worked_examples() {
        let top = MetricsVector {
            quality: Some(9.5),
            delivery_on_time_pct: Some(98.0),
            price_competitiveness: Some(9.0),
            service: Some(9.0),
            compliance: None,
        };
        assert_eq!(StateMapper::discretize(&top).to_string(), "Q5_D5_P5_S5");

        let bottom = MetricsVector {
            quality: Some(2.0),
            delivery_on_time_pct: Some(60.0),
            price_competitiveness: Some(3.0),
            service: Some(2.0),
            compliance: None,
        };
        assert_eq!(StateMapper::discretize(&bottom).to_string(), "Q1_D1_P2_S1");
    }

    #[test]
    fn empty_metrics_map_to_mid_tier() {
        let key = StateMapper::discretize(&MetricsVector::default());
        assert_eq!(key.to_string(), "Q3_D3_P3_S3");
    }

    #[test]
    fn state_space_is_closed_at_625() {
        let all = StateMapper::all_possible_states();
        assert_eq!(all.len(), STATE_SPACE_SIZE);
        let unique: std::collections::BTreeSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), STATE_SPACE_SIZE);
        assert_eq!(all.first().unwrap().to_string(), "Q1_D1_P1_S1");
        assert_eq!(all.last().unwrap().to_string(), "Q5_D5_P5_S5");
    }

    #[test]
    fn key_parse_round_trip() {
        let key = StateKey::new(2, 5, 1, 4);
        assert_eq!(StateKey::parse(&key.to_string()).unwrap(), key);
        assert!(StateKey::parse("Q6_D1_P1_S1").is_err());
        assert!(StateKey::parse("Q1_D1_P1").is_err());
        assert!(StateKey::parse("A1_B1_C1_D1").is_err());
    }

    #[test]
    fn registry_insert_is_idempotent() {
        let registry = StateRegistry::new();
        let key = StateKey::new(3, 3, 3, 3);
        let first = registry.get_or_create(key);
        let second = registry.get_or_create(key);
        assert_eq!(registry.len(), 1);
        assert_eq!(first.first_seen, second.first_seen);
        assert_eq!(first.description, "Quality: 3/5, Delivery: 3/5, Price: 3/5, Service: 3/5");
    }

    #[test]
    fn variance_and_average() {
        let key = StateKey::new(1, 5, 1, 5);
        assert!((key.average() - 3.0).abs() < 1e-9);
        assert!((key.variance() - 4.0).abs() < 1e-9);
        let flat = StateKey::new(4, 4, 4, 4);
        assert!(flat.variance().abs() < 1e-9);
    }
}
