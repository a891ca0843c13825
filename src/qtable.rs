//! The Q-table: the sole learned artifact.
//!
//! A lock-protected mapping `(state, action) -> (value, update count)`.
//! Entries are created lazily with value 0.0; a reset zeroes values and
//! counts in place but keeps the rows. Multiple suppliers can map to the
//! same state within one parallel run, so every read-modify-write happens
//! under the table lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::state::StateKey;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QTableEntry {
    pub q_value: f64,
    pub update_count: u64,
    pub last_updated: DateTime<Utc>,
}

impl QTableEntry {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            q_value: 0.0,
            update_count: 0,
            last_updated: Utc::now(),
        }
    }
}

/// One exported row, keyed for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTableRow {
    pub state: StateKey,
    pub action: Action,
    pub q_value: f64,
    pub update_count: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct QTable {
    entries: Mutex<HashMap<(StateKey, Action), QTableEntry>>,
}

impl QTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Q-value for a pair; 0.0 when absent. Does not create the entry.
    #[must_use]
    pub fn value(&self, state: StateKey, action: Action) -> f64 {
        self.entries
            .lock()
            .get(&(state, action))
            .map_or(0.0, |e| e.q_value)
    }

    /// Q-value for a pair, lazily creating a zero entry when absent.
    pub fn ensure(&self, state: StateKey, action: Action) -> f64 {
        self.entries
            .lock()
            .entry((state, action))
            .or_insert_with(QTableEntry::zero)
            .q_value
    }

    /// Maximum Q-value over the given actions in `state`, lazily creating
    /// zero entries. 0.0 when `actions` is empty.
    pub fn max_value(&self, state: StateKey, actions: &[Action]) -> f64 {
        let mut entries = self.entries.lock();
        actions
            .iter()
            .map(|&action| {
                entries
                    .entry((state, action))
                    .or_insert_with(QTableEntry::zero)
                    .q_value
            })
            .fold(None, |best: Option<f64>, q| {
                Some(best.map_or(q, |b| b.max(q)))
            })
            .unwrap_or(0.0)
    }

    /// Atomic read-modify-write of one entry under the table lock.
    /// Returns the new value after incrementing the update count.
    pub fn apply_update(
        &self,
        state: StateKey,
        action: Action,
        update: impl FnOnce(f64) -> f64,
    ) -> f64 {
        let mut entries = self.entries.lock();
        let entry = entries
            .entry((state, action))
            .or_insert_with(QTableEntry::zero);
        entry.q_value = update(entry.q_value);
        entry.update_count += 1;
        entry.last_updated = Utc::now();
        entry.q_value
    }

    /// Zero every entry's value and count; rows are preserved.
    pub fn reset(&self) {
        let now = Utc::now();
        for entry in self.entries.lock().values_mut() {
            entry.q_value = 0.0;
            entry.update_count = 0;
            entry.last_updated = now;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Sorted export of the table, optionally restricted to one state.
    #[must_use]
    pub fn export(&self, filter: Option<StateKey>) -> Vec<QTableRow> {
        let entries = self.entries.lock();
        let mut rows: Vec<QTableRow> = entries
            .iter()
            .filter(|((state, _), _)| filter.is_none_or(|f| *state == f))
            .map(|(&(state, action), entry)| QTableRow {
                state,
                action,
                q_value: entry.q_value,
                update_count: entry.update_count,
                last_updated: entry.last_updated,
            })
            .collect();
        rows.sort_by(|a, b| (a.state, a.action).cmp(&(b.state, b.action)));
        rows
    }

    /// Seed the table from persisted rows. Existing entries win.
    pub fn load_rows(&self, rows: impl IntoIterator<Item = QTableRow>) {
        let mut entries = self.entries.lock();
        for row in rows {
            entries.entry((row.state, row.action)).or_insert(QTableEntry {
                q_value: row.q_value,
                update_count: row.update_count,
                last_updated: row.last_updated,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entries_read_as_zero() {
        let table = QTable::new();
        let state = StateKey::new(1, 2, 3, 4);
        assert!(table.value(state, Action::FlagForAudit).abs() < f64::EPSILON);
        assert!(table.is_empty());
        // ensure creates the row
        assert!(table.ensure(state, Action::FlagForAudit).abs() < f64::EPSILON);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn apply_update_increments_count() {
        let table = QTable::new();
        let state = StateKey::new(3, 3, 3, 3);
        let new = table.apply_update(state, Action::RankTier3, |q| q + 1.5);
        assert!((new - 1.5).abs() < 1e-9);
        let rows = table.export(Some(state));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].update_count, 1);
    }

    #[test]
    fn reset_zeroes_but_keeps_rows() {
        let table = QTable::new();
        let state = StateKey::new(2, 2, 2, 2);
        table.apply_update(state, Action::RankTier1, |_| 4.2);
        table.apply_update(state, Action::RankTier2, |_| -1.0);
        table.reset();
        assert_eq!(table.len(), 2);
        for row in table.export(None) {
            assert!(row.q_value.abs() < f64::EPSILON);
            assert_eq!(row.update_count, 0);
        }
    }

    #[test]
    fn export_filter_restricts_to_state() {
        let table = QTable::new();
        let a = StateKey::new(1, 1, 1, 1);
        let b = StateKey::new(5, 5, 5, 5);
        table.ensure(a, Action::RankTier1);
        table.ensure(b, Action::RankTier5);
        assert_eq!(table.export(Some(a)).len(), 1);
        assert_eq!(table.export(None).len(), 2);
    }

    #[test]
    fn max_value_over_negative_entries() {
        let table = QTable::new();
        let state = StateKey::new(1, 1, 1, 1);
        table.apply_update(state, Action::RankTier1, |_| -3.0);
        table.apply_update(state, Action::RankTier2, |_| -1.0);
        let max = table.max_value(state, &[Action::RankTier1, Action::RankTier2]);
        assert!((max - -1.0).abs() < 1e-9);
    }
}
