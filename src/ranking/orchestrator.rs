//! The ranking orchestrator.
//!
//! Drives one ranking run for the full active-supplier set: fetch metrics,
//! discretize, pick the greedy action, compute the reward, update the
//! Q-table, assign a total-order rank and persist the row. Supplier
//! failures are per-supplier and never abort the batch; the only
//! externally visible failure mode is a missing row, detectable by
//! comparing output count against the active-supplier count.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rayon::prelude::*;
use serde_json::json;
use tracing::{info, warn};

use crate::action::Action;
use crate::agent::{Agent, Environment, TrainingStats};
use crate::config::RankingConfig;
use crate::error::Result;
use crate::metrics::{
    DimensionScores, MetricsProvider, MetricsVector, SupplierDirectory, fetch_with_timeout,
};
use crate::qtable::{QTable, QTableRow};
use crate::ranking::{EventSink, EventType, RankingEvent, RankingStore, SupplierRanking};
use crate::reward::RewardModel;
use crate::state::{StateKey, StateMapper, StateRegistry};

/// One supplier's fetched inputs, before rank assignment.
struct Candidate {
    supplier_id: i64,
    name: String,
    metrics: MetricsVector,
    scores: DimensionScores,
    overall: f64,
    degraded: bool,
}

pub struct RankingEngine {
    config: RankingConfig,
    registry: Arc<StateRegistry>,
    qtable: Arc<QTable>,
    agent: Agent,
    reward_model: RewardModel,
    provider: Arc<dyn MetricsProvider>,
    directory: Arc<dyn SupplierDirectory>,
    store: Arc<dyn RankingStore>,
    events: Arc<dyn EventSink>,
}

impl RankingEngine {
    #[must_use]
    pub fn new(
        config: RankingConfig,
        provider: Arc<dyn MetricsProvider>,
        directory: Arc<dyn SupplierDirectory>,
        store: Arc<dyn RankingStore>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let qtable = Arc::new(QTable::new());
        let agent = Agent::new(Arc::clone(&qtable), &config);
        let reward_model = RewardModel::new(config.weights);
        Self {
            config,
            registry: Arc::new(StateRegistry::new()),
            qtable,
            agent,
            reward_model,
            provider,
            directory,
            store,
            events,
        }
    }

    #[must_use]
    pub fn qtable(&self) -> &Arc<QTable> {
        &self.qtable
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    #[must_use]
    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Event recording is best-effort: a failing sink is logged, never
    /// propagated.
    fn emit(&self, event: RankingEvent) {
        if let Err(err) = self.events.record(&event) {
            warn!(%err, event_type = %event.event_type, "failed to record ranking event");
        }
    }

    /// Fetch with bounded timeout; on failure substitute neutral metrics
    /// and emit a warning event so ranking always completes.
    fn fetch_metrics(&self, supplier_id: i64) -> (MetricsVector, bool) {
        let timeout = Duration::from_millis(self.config.metrics_timeout_ms);
        match fetch_with_timeout(&self.provider, supplier_id, self.config.window_days, timeout) {
            Ok(metrics) => {
                self.emit(
                    RankingEvent::new(EventType::DataFetched)
                        .supplier(supplier_id)
                        .metadata(json!({
                            "quality": metrics.quality_score(),
                            "delivery": metrics.delivery_pct(),
                            "price": metrics.price_score(),
                            "service": metrics.service_score(),
                        })),
                );
                (metrics, false)
            }
            Err(err) => {
                warn!(supplier_id, %err, "metrics unavailable, using neutral defaults");
                self.emit(
                    RankingEvent::new(EventType::Warning)
                        .supplier(supplier_id)
                        .metadata(json!({ "reason": err.to_string() })),
                );
                (MetricsVector::neutral(), true)
            }
        }
    }

    fn candidate(&self, supplier_id: i64) -> Candidate {
        let (metrics, degraded) = self.fetch_metrics(supplier_id);
        let scores = metrics.dimension_scores();
        let overall = scores.overall(&self.config.weights);
        let name = self
            .directory
            .supplier_name(supplier_id)
            .unwrap_or_else(|_| format!("Supplier {supplier_id}"));
        Candidate {
            supplier_id,
            name,
            metrics,
            scores,
            overall,
            degraded,
        }
    }

    /// Generate and persist today's rankings for all active suppliers.
    ///
    /// Ranks form a total order by overall score descending:
    /// `rank = 1 + count of suppliers with strictly higher score`, so ties
    /// share the smallest rank and distinct scores yield a permutation of
    /// `1..=N`.
    pub fn generate_rankings(&self) -> Result<Vec<SupplierRanking>> {
        let supplier_ids = self.directory.active_supplier_ids()?;
        let today = Utc::now().date_naive();
        info!(suppliers = supplier_ids.len(), %today, "ranking run started");
        self.emit(
            RankingEvent::new(EventType::RankingStarted)
                .metadata(json!({ "suppliers": supplier_ids.len(), "date": today })),
        );

        // Phase 1: fetch all inputs (parallel; no shared mutable state).
        let mut candidates: Vec<Candidate> = supplier_ids
            .par_iter()
            .map(|&id| self.candidate(id))
            .collect();

        // Phase 2: stable sort by score descending, then competition ranks.
        candidates.sort_by(|a, b| {
            b.overall
                .partial_cmp(&a.overall)
                .unwrap_or(Ordering::Equal)
        });
        let mut ranks = vec![0u32; candidates.len()];
        for i in 0..candidates.len() {
            ranks[i] = if i > 0 && (candidates[i].overall - candidates[i - 1].overall).abs() < 1e-12
            {
                ranks[i - 1]
            } else {
                u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1)
            };
        }

        // Phase 3: per supplier, independently and in parallel; the
        // Q-table serializes its own read-modify-writes.
        let mut rankings: Vec<SupplierRanking> = candidates
            .par_iter()
            .zip(ranks.par_iter())
            .filter_map(|(candidate, &rank)| self.rank_one(candidate, rank, today))
            .collect();
        rankings.sort_by_key(|r| (r.rank, r.supplier_id));

        self.emit(
            RankingEvent::new(EventType::RankingCompleted).metadata(json!({
                "requested": supplier_ids.len(),
                "ranked": rankings.len(),
                "date": today,
            })),
        );
        info!(
            ranked = rankings.len(),
            requested = supplier_ids.len(),
            "ranking run completed"
        );
        Ok(rankings)
    }

    /// One supplier's select -> reward -> learn -> persist cycle. Returns
    /// `None` when persistence fails; the batch continues without it.
    fn rank_one(
        &self,
        candidate: &Candidate,
        rank: u32,
        date: chrono::NaiveDate,
    ) -> Option<SupplierRanking> {
        let state = StateMapper::discretize(&candidate.metrics);
        self.registry.get_or_create(state);

        let action = self.agent.select_action(state, &Action::ALL, false);
        let reward = self.reward_model.reward(state, action);
        // Degenerate dynamics: the next state is the current state.
        self.agent.learn(state, action, reward, state);

        let ranking = SupplierRanking {
            supplier_id: candidate.supplier_id,
            supplier_name: candidate.name.clone(),
            date,
            quality_score: candidate.scores.quality,
            delivery_score: candidate.scores.delivery,
            price_score: candidate.scores.price,
            service_score: candidate.scores.service,
            overall_score: candidate.overall,
            rank,
            state_key: state,
            notes: if candidate.degraded {
                format!("Ranking generated via {action} in state {state} (neutral fallback metrics)")
            } else {
                format!("Ranking generated via {action} in state {state}")
            },
        };

        if let Err(err) = self.store.upsert(&ranking) {
            warn!(supplier_id = candidate.supplier_id, %err, "failed to persist ranking");
            self.emit(
                RankingEvent::new(EventType::Error)
                    .supplier(candidate.supplier_id)
                    .state(state)
                    .action(action)
                    .metadata(json!({ "reason": err.to_string() })),
            );
            return None;
        }

        self.emit(
            RankingEvent::new(EventType::ActionChosen)
                .supplier(candidate.supplier_id)
                .state(state)
                .action(action)
                .reward(reward)
                .metadata(json!({ "rank": rank, "overall_score": candidate.overall })),
        );
        Some(ranking)
    }

    /// Warm up the Q-table without ranking side effects.
    pub fn train_batch(
        &self,
        iterations: u32,
        supplier_ids: Option<Vec<i64>>,
    ) -> Result<TrainingStats> {
        let ids = match supplier_ids {
            Some(ids) => ids,
            None => self.directory.active_supplier_ids()?,
        };
        self.emit(
            RankingEvent::new(EventType::TrainingStarted)
                .metadata(json!({ "iterations": iterations, "suppliers": ids.len() })),
        );
        let stats = self.agent.train_batch(self, iterations, &ids);
        self.emit(
            RankingEvent::new(EventType::TrainingCompleted).metadata(json!({
                "iterations": stats.iterations,
                "total_updates": stats.total_updates,
                "avg_reward": stats.avg_reward,
            })),
        );
        Ok(stats)
    }

    /// Zero every Q-table entry, preserving rows.
    pub fn reset_q_table(&self) {
        self.qtable.reset();
        self.emit(RankingEvent::new(EventType::QTableReset));
        info!("q-table reset");
    }

    /// Snapshot of the Q-table, optionally restricted to one state.
    #[must_use]
    pub fn export_q_table(&self, filter: Option<StateKey>) -> Vec<QTableRow> {
        self.qtable.export(filter)
    }

    /// Greedy best action for a state (no exploration).
    #[must_use]
    pub fn best_action(&self, state: StateKey) -> Action {
        self.agent.select_action(state, &Action::ALL, false)
    }

    /// Current discretized state for one supplier (registers it).
    pub fn state_of_supplier(&self, supplier_id: i64) -> Result<StateKey> {
        let timeout = Duration::from_millis(self.config.metrics_timeout_ms);
        let metrics =
            fetch_with_timeout(&self.provider, supplier_id, self.config.window_days, timeout)?;
        let state = StateMapper::discretize(&metrics);
        self.registry.get_or_create(state);
        Ok(state)
    }

    /// Greedy policy: best action for every observed state, or for one
    /// supplier's current state.
    pub fn policy(&self, supplier_id: Option<i64>) -> Result<Vec<(StateKey, Action)>> {
        let states: Vec<StateKey> = match supplier_id {
            Some(id) => vec![self.state_of_supplier(id)?],
            None => self.registry.snapshot().into_iter().map(|s| s.key).collect(),
        };
        Ok(self.agent.policy(&states))
    }
}

impl Environment for RankingEngine {
    fn state_of(&self, supplier_id: i64) -> Result<StateKey> {
        self.state_of_supplier(supplier_id)
    }

    fn reward_of(&self, _supplier_id: i64, state: StateKey, action: Action) -> f64 {
        self.reward_model.reward(state, action)
    }
}
