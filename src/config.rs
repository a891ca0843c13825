//! Ranking configuration.
//!
//! One configuration is active per run: the explicit `--config` path, the
//! `RANQ_CONFIG` env var, or `config.toml` under the data root, in that
//! order, with `RANQ_*` env overrides applied last. A missing file falls
//! back to the hard-coded default so the engine never halts for lack of
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RanqError, Result};

/// Per-dimension weights used for rewards and overall scores.
/// Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub quality: f64,
    pub delivery: f64,
    pub price: f64,
    pub service: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            quality: 0.25,
            delivery: 0.25,
            price: 0.25,
            service: 0.25,
        }
    }
}

impl DimensionWeights {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.quality + self.delivery + self.price + self.service
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Bellman step size (alpha).
    pub learning_rate: f64,
    /// Discount factor (gamma).
    pub discount_factor: f64,
    /// Epsilon for epsilon-greedy selection.
    pub exploration_rate: f64,
    /// Floor that batch-training decay never crosses.
    pub min_exploration_rate: f64,
    pub weights: DimensionWeights,
    /// Look-back window passed to the metrics provider, in days.
    pub window_days: u32,
    /// Bounded timeout for one metrics fetch.
    pub metrics_timeout_ms: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            exploration_rate: 0.3,
            min_exploration_rate: 0.05,
            weights: DimensionWeights::default(),
            window_days: 90,
            metrics_timeout_ms: 2000,
        }
    }
}

impl RankingConfig {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("RANQ_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load_file(&path)?.ok_or_else(|| {
                RanqError::Config(format!("config file not found: {}", path.display()))
            })?,
            None => Self::load_file(&root.join("config.toml"))?.unwrap_or_default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| RanqError::Config(format!("read config {}: {err}", path.display())))?;
        let config = toml::from_str(&raw)
            .map_err(|err| RanqError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(config))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_f64("RANQ_LEARNING_RATE")? {
            self.learning_rate = value;
        }
        if let Some(value) = env_f64("RANQ_DISCOUNT_FACTOR")? {
            self.discount_factor = value;
        }
        if let Some(value) = env_f64("RANQ_EXPLORATION_RATE")? {
            self.exploration_rate = value;
        }
        if let Some(value) = env_u32("RANQ_WINDOW_DAYS")? {
            self.window_days = value;
        }
        if let Some(value) = env_u64("RANQ_METRICS_TIMEOUT_MS")? {
            self.metrics_timeout_ms = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(RanqError::Config(format!(
                "dimension weights must sum to 1.0, got {sum}"
            )));
        }
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("exploration_rate", self.exploration_rate),
            ("min_exploration_rate", self.min_exploration_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RanqError::Config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| RanqError::Config(format!("invalid float in {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| RanqError::Config(format!("invalid integer in {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| RanqError::Config(format!("invalid integer in {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}
