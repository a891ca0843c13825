//! The tabular Q-learning agent.
//!
//! Epsilon-greedy action selection and the Bellman update against an
//! injected, lock-protected [`QTable`]. The modeled environment is a
//! single-step stationary bandit: no transition model exists, so the next
//! state passed to [`Agent::learn`] is always the current state and the
//! discount term bootstraps off the same state's own action values. That
//! is deliberate and must not be "fixed" into real dynamics.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::action::Action;
use crate::config::RankingConfig;
use crate::error::Result;
use crate::qtable::QTable;
use crate::state::StateKey;

/// Minimal environment surface the agent trains against. The ranking
/// engine implements this; tests substitute fixtures.
pub trait Environment: Sync {
    /// Current discretized state for a supplier.
    fn state_of(&self, supplier_id: i64) -> Result<StateKey>;
    /// Reward for taking `action` in `state` for this supplier.
    fn reward_of(&self, supplier_id: i64, state: StateKey, action: Action) -> f64;
}

/// Aggregate statistics from one batch-training run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingStats {
    pub iterations: u32,
    pub suppliers_trained: usize,
    pub total_updates: u64,
    pub avg_reward: f64,
    pub max_reward: f64,
    pub min_reward: f64,
}

pub struct Agent {
    qtable: Arc<QTable>,
    learning_rate: f64,
    discount_factor: f64,
    exploration_rate: f64,
    min_exploration_rate: f64,
    rng: Mutex<StdRng>,
}

impl Agent {
    #[must_use]
    pub fn new(qtable: Arc<QTable>, config: &RankingConfig) -> Self {
        Self {
            qtable,
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            exploration_rate: config.exploration_rate,
            min_exploration_rate: config.min_exploration_rate,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reseed the RNG for deterministic selection in tests.
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
    }

    #[must_use]
    pub fn qtable(&self) -> &Arc<QTable> {
        &self.qtable
    }

    /// Epsilon-greedy selection. With `explore` off the choice is purely
    /// greedy; ties among maximal Q-values break uniformly at random.
    pub fn select_action(&self, state: StateKey, actions: &[Action], explore: bool) -> Action {
        self.select_with_epsilon(state, actions, if explore { self.exploration_rate } else { 0.0 })
    }

    fn select_with_epsilon(&self, state: StateKey, actions: &[Action], epsilon: f64) -> Action {
        let actions = if actions.is_empty() { &Action::ALL[..] } else { actions };
        let mut rng = self.rng.lock();

        if epsilon > 0.0 && rng.random::<f64>() < epsilon {
            return *actions.choose(&mut *rng).unwrap_or(&Action::RankTier3);
        }

        let values: Vec<(Action, f64)> = actions
            .iter()
            .map(|&action| (action, self.qtable.ensure(state, action)))
            .collect();
        let max_q = values
            .iter()
            .map(|(_, q)| *q)
            .fold(f64::NEG_INFINITY, f64::max);
        let best: Vec<Action> = values
            .iter()
            .filter(|(_, q)| (*q - max_q).abs() < f64::EPSILON)
            .map(|(action, _)| *action)
            .collect();
        *best.choose(&mut *rng).unwrap_or(&actions[0])
    }

    /// Bellman update: `Q <- Q + alpha * (r + gamma * maxQ' - Q)`.
    /// Entries are created lazily with value 0.0. Returns the new Q-value.
    pub fn learn(
        &self,
        state: StateKey,
        action: Action,
        reward: f64,
        next_state: StateKey,
    ) -> f64 {
        let max_next = self.qtable.max_value(next_state, &Action::ALL);
        let alpha = self.learning_rate;
        let gamma = self.discount_factor;
        let new_q = self.qtable.apply_update(state, action, |current| {
            current + alpha * (reward + gamma * max_next - current)
        });
        debug!(%state, %action, reward, new_q, "q-value updated");
        new_q
    }

    /// Pure Q-table warm-up: for each iteration, one exploratory
    /// select -> reward -> learn cycle per supplier, with no ranking side
    /// effects. Epsilon decays linearly per iteration down to the
    /// configured floor.
    pub fn train_batch(
        &self,
        env: &dyn Environment,
        iterations: u32,
        supplier_ids: &[i64],
    ) -> TrainingStats {
        let mut stats = TrainingStats {
            iterations,
            suppliers_trained: supplier_ids.len(),
            ..TrainingStats::default()
        };
        let mut total_reward = 0.0;
        let mut max_reward = f64::NEG_INFINITY;
        let mut min_reward = f64::INFINITY;

        for i in 0..iterations {
            let progress = f64::from(i) / f64::from(iterations.max(1));
            let epsilon = (self.exploration_rate * (1.0 - progress))
                .max(self.min_exploration_rate);

            for &supplier_id in supplier_ids {
                let Ok(state) = env.state_of(supplier_id) else {
                    debug!(supplier_id, "skipping supplier with no state");
                    continue;
                };
                let action = self.select_with_epsilon(state, &Action::ALL, epsilon);
                let reward = env.reward_of(supplier_id, state, action);
                self.learn(state, action, reward, state);

                stats.total_updates += 1;
                total_reward += reward;
                max_reward = max_reward.max(reward);
                min_reward = min_reward.min(reward);
            }
        }

        if stats.total_updates > 0 {
            #[allow(clippy::cast_precision_loss)]
            {
                stats.avg_reward = total_reward / stats.total_updates as f64;
            }
            stats.max_reward = max_reward;
            stats.min_reward = min_reward;
        }
        stats
    }

    /// Greedy policy over the given states: best action per state.
    #[must_use]
    pub fn policy(&self, states: &[StateKey]) -> Vec<(StateKey, Action)> {
        states
            .iter()
            .map(|&state| (state, self.select_action(state, &Action::ALL, false)))
            .collect()
    }

    /// Zero the whole table in place.
    pub fn reset(&self) {
        self.qtable.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingConfig;

    fn agent_with(config: RankingConfig, seed: u64) -> Agent {
        let agent = Agent::new(Arc::new(QTable::new()), &config);
        agent.reseed(seed);
        agent
    }

    #[test]
    fn learn_converges_to_constant_reward_with_zero_gamma() {
        let config = RankingConfig {
            discount_factor: 0.0,
            learning_rate: 0.5,
            ..RankingConfig::default()
        };
        let agent = agent_with(config, 1);
        let state = StateKey::new(3, 3, 3, 3);
        let mut q = 0.0;
        for _ in 0..60 {
            let next = agent.learn(state, Action::RankTier3, 7.5, state);
            assert!(next >= q || (next - 7.5).abs() < 1e-6);
            q = next;
        }
        assert!((q - 7.5).abs() < 1e-6);
    }

    #[test]
    fn greedy_selection_prefers_highest_q() {
        let config = RankingConfig {
            exploration_rate: 0.0,
            ..RankingConfig::default()
        };
        let agent = agent_with(config, 2);
        let state = StateKey::new(5, 5, 5, 5);
        agent.qtable().apply_update(state, Action::RankTier1, |_| 9.0);
        agent.qtable().apply_update(state, Action::RankTier5, |_| 1.0);
        for _ in 0..20 {
            assert_eq!(
                agent.select_action(state, &Action::ALL, true),
                Action::RankTier1
            );
        }
    }

    #[test]
    fn full_exploration_visits_every_action() {
        let config = RankingConfig {
            exploration_rate: 1.0,
            ..RankingConfig::default()
        };
        let agent = agent_with(config, 3);
        let state = StateKey::new(1, 1, 1, 1);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..400 {
            seen.insert(agent.select_action(state, &Action::ALL, true));
        }
        assert_eq!(seen.len(), Action::ALL.len());
    }

    #[test]
    fn learn_bootstraps_off_same_state() {
        let config = RankingConfig {
            learning_rate: 1.0,
            discount_factor: 0.5,
            ..RankingConfig::default()
        };
        let agent = agent_with(config, 4);
        let state = StateKey::new(2, 2, 2, 2);
        // First update: maxQ' over the (all-zero) same state is 0.
        let q1 = agent.learn(state, Action::RankTier4, 4.0, state);
        assert!((q1 - 4.0).abs() < 1e-9);
        // Second update bootstraps off the value just written.
        let q2 = agent.learn(state, Action::RankTier4, 4.0, state);
        assert!((q2 - 6.0).abs() < 1e-9);
    }

    struct FixedEnv;
    impl Environment for FixedEnv {
        fn state_of(&self, supplier_id: i64) -> Result<StateKey> {
            Ok(if supplier_id % 2 == 0 {
                StateKey::new(4, 4, 4, 4)
            } else {
                StateKey::new(2, 2, 2, 2)
            })
        }
        fn reward_of(&self, _: i64, state: StateKey, _: Action) -> f64 {
            state.average()
        }
    }

    #[test]
    fn train_batch_accumulates_stats() {
        let agent = agent_with(RankingConfig::default(), 5);
        let stats = agent.train_batch(&FixedEnv, 10, &[1, 2, 3]);
        assert_eq!(stats.iterations, 10);
        assert_eq!(stats.suppliers_trained, 3);
        assert_eq!(stats.total_updates, 30);
        assert!(stats.max_reward >= stats.min_reward);
        assert!(stats.avg_reward > 0.0);
        assert!(!agent.qtable().is_empty());
    }

    #[test]
    fn reset_clears_learned_values() {
        let agent = agent_with(RankingConfig::default(), 6);
        let state = StateKey::new(3, 3, 3, 3);
        agent.learn(state, Action::FlagForAudit, 8.0, state);
        agent.reset();
        assert!(agent.qtable().value(state, Action::FlagForAudit).abs() < f64::EPSILON);
        assert!(!agent.qtable().is_empty());
    }
}
