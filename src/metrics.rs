//! Metrics input and collaborator interfaces.
//!
//! The metrics-aggregation pipeline is an external collaborator: this
//! crate receives four normalized performance scores (plus an optional
//! compliance score) through [`MetricsProvider`] and never computes them
//! from raw order history. Missing fields degrade to mid-range defaults
//! so a state can always be produced.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RanqError, Result};

/// Mid-range default for 0-10 scores (quality, price, service, compliance).
pub const DEFAULT_SCORE: f64 = 5.0;
/// Mid-range default for the on-time delivery percentage.
pub const DEFAULT_DELIVERY_PCT: f64 = 80.0;

/// Raw performance scores for one supplier over the metrics window.
///
/// Quality, price and service are nominally 0-10; delivery is a 0-100
/// percentage. All fields are optional so partial upstream data is
/// tolerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsVector {
    pub quality: Option<f64>,
    pub delivery_on_time_pct: Option<f64>,
    pub price_competitiveness: Option<f64>,
    pub service: Option<f64>,
    pub compliance: Option<f64>,
}

impl MetricsVector {
    /// The fallback vector substituted when a fetch fails or times out.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            quality: Some(DEFAULT_SCORE),
            delivery_on_time_pct: Some(DEFAULT_DELIVERY_PCT),
            price_competitiveness: Some(DEFAULT_SCORE),
            service: Some(DEFAULT_SCORE),
            compliance: Some(DEFAULT_SCORE),
        }
    }

    #[must_use]
    pub fn quality_score(&self) -> f64 {
        self.quality.unwrap_or(DEFAULT_SCORE)
    }

    #[must_use]
    pub fn delivery_pct(&self) -> f64 {
        self.delivery_on_time_pct.unwrap_or(DEFAULT_DELIVERY_PCT)
    }

    #[must_use]
    pub fn price_score(&self) -> f64 {
        self.price_competitiveness.unwrap_or(DEFAULT_SCORE)
    }

    /// Service score, blended with compliance when both are present.
    #[must_use]
    pub fn service_score(&self) -> f64 {
        match (self.service, self.compliance) {
            (Some(service), Some(compliance)) => (service + compliance) / 2.0,
            (Some(service), None) => service,
            (None, _) => DEFAULT_SCORE,
        }
    }

    /// Project onto the four 0-10 ranking dimensions (delivery pct / 10).
    #[must_use]
    pub fn dimension_scores(&self) -> DimensionScores {
        DimensionScores {
            quality: self.quality_score().clamp(0.0, 10.0),
            delivery: (self.delivery_pct() / 10.0).clamp(0.0, 10.0),
            price: self.price_score().clamp(0.0, 10.0),
            service: self.service_score().clamp(0.0, 10.0),
        }
    }
}

/// The four 0-10 dimension scores persisted on a ranking row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub quality: f64,
    pub delivery: f64,
    pub price: f64,
    pub service: f64,
}

impl DimensionScores {
    /// Weighted overall score; weights are expected to sum to 1.0.
    #[must_use]
    pub fn overall(&self, weights: &crate::config::DimensionWeights) -> f64 {
        self.quality * weights.quality
            + self.delivery * weights.delivery
            + self.price * weights.price
            + self.service * weights.service
    }
}

/// Source of supplier performance metrics (the excluded aggregation
/// pipeline). May block; callers wrap it with [`fetch_with_timeout`].
pub trait MetricsProvider: Send + Sync {
    fn metrics(&self, supplier_id: i64, window_days: u32) -> Result<MetricsVector>;
}

/// Supplier identity collaborator.
pub trait SupplierDirectory: Send + Sync {
    fn active_supplier_ids(&self) -> Result<Vec<i64>>;
    fn supplier_name(&self, supplier_id: i64) -> Result<String>;
}

/// Call the provider with a bounded timeout.
///
/// On timeout the worker thread is detached, not cancelled; the provider
/// call owns all of its inputs so an abandoned call cannot touch engine
/// state. The caller substitutes [`MetricsVector::neutral`] on error.
pub fn fetch_with_timeout(
    provider: &Arc<dyn MetricsProvider>,
    supplier_id: i64,
    window_days: u32,
    timeout: Duration,
) -> Result<MetricsVector> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let provider = Arc::clone(provider);
    std::thread::spawn(move || {
        let _ = tx.send(provider.metrics(supplier_id, window_days));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(RanqError::MetricsUnavailable {
            supplier_id,
            reason: format!("timed out after {}ms", timeout.as_millis()),
        }),
    }
}

// =============================================================================
// FILE-BACKED CATALOG (CLI collaborator)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEntry {
    id: i64,
    name: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    metrics: MetricsVector,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    suppliers: Vec<CatalogEntry>,
}

/// JSON-file-backed supplier catalog serving as both [`MetricsProvider`]
/// and [`SupplierDirectory`] so the CLI runs end to end without the
/// external services.
pub struct FileCatalog {
    entries: HashMap<i64, CatalogEntry>,
}

impl FileCatalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RanqError::Config(format!("read supplier catalog {}: {err}", path.display()))
        })?;
        let doc: CatalogDocument = serde_json::from_str(&raw).map_err(|err| {
            RanqError::Config(format!("parse supplier catalog {}: {err}", path.display()))
        })?;
        Ok(Self {
            entries: doc.suppliers.into_iter().map(|e| (e.id, e)).collect(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetricsProvider for FileCatalog {
    fn metrics(&self, supplier_id: i64, _window_days: u32) -> Result<MetricsVector> {
        self.entries
            .get(&supplier_id)
            .map(|e| e.metrics)
            .ok_or_else(|| RanqError::MetricsUnavailable {
                supplier_id,
                reason: "supplier not in catalog".to_string(),
            })
    }
}

impl SupplierDirectory for FileCatalog {
    fn active_supplier_ids(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .entries
            .values()
            .filter(|e| e.active)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn supplier_name(&self, supplier_id: i64) -> Result<String> {
        Ok(self
            .entries
            .get(&supplier_id)
            .map_or_else(|| format!("Supplier {supplier_id}"), |e| e.name.clone()))
    }
}
