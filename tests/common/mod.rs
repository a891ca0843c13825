//! Shared fixtures for integration tests: in-memory collaborator
//! implementations so engine behavior can be exercised without SQLite.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use ranq::config::RankingConfig;
use ranq::error::{RanqError, Result};
use ranq::metrics::{MetricsProvider, MetricsVector, SupplierDirectory};
use ranq::ranking::{EventSink, RankingEngine, RankingEvent, RankingStore, SupplierRanking};

/// Provider backed by a fixed map; ids absent from the map fail with
/// `MetricsUnavailable`.
pub struct MapProvider {
    pub metrics: HashMap<i64, MetricsVector>,
}

impl MetricsProvider for MapProvider {
    fn metrics(&self, supplier_id: i64, _window_days: u32) -> Result<MetricsVector> {
        self.metrics
            .get(&supplier_id)
            .copied()
            .ok_or(RanqError::MetricsUnavailable {
                supplier_id,
                reason: "not in fixture".to_string(),
            })
    }
}

pub struct ListDirectory {
    pub ids: Vec<i64>,
}

impl SupplierDirectory for ListDirectory {
    fn active_supplier_ids(&self) -> Result<Vec<i64>> {
        Ok(self.ids.clone())
    }

    fn supplier_name(&self, supplier_id: i64) -> Result<String> {
        Ok(format!("Supplier {supplier_id}"))
    }
}

/// In-memory ranking store with configurable per-supplier failures.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<HashMap<(i64, NaiveDate), SupplierRanking>>,
    pub fail_for: Vec<i64>,
}

impl RankingStore for MemoryStore {
    fn upsert(&self, ranking: &SupplierRanking) -> Result<()> {
        if self.fail_for.contains(&ranking.supplier_id) {
            return Err(RanqError::Persistence {
                supplier_id: ranking.supplier_id,
                reason: "fixture failure".to_string(),
            });
        }
        self.rows
            .lock()
            .insert((ranking.supplier_id, ranking.date), ranking.clone());
        Ok(())
    }

    fn latest_for(&self, date: NaiveDate) -> Result<Vec<SupplierRanking>> {
        let mut rows: Vec<SupplierRanking> = self
            .rows
            .lock()
            .values()
            .filter(|r| r.date == date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.rank, r.supplier_id));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub events: Mutex<Vec<RankingEvent>>,
}

impl EventSink for MemorySink {
    fn record(&self, event: &RankingEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

pub struct Fixture {
    pub engine: RankingEngine,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<MemorySink>,
}

/// Build an engine over in-memory collaborators with a deterministic RNG.
pub fn engine_with(
    metrics: HashMap<i64, MetricsVector>,
    ids: Vec<i64>,
    fail_for: Vec<i64>,
    config: RankingConfig,
) -> Fixture {
    let store = Arc::new(MemoryStore {
        rows: Mutex::new(HashMap::new()),
        fail_for,
    });
    let sink = Arc::new(MemorySink::default());
    let engine = RankingEngine::new(
        config,
        Arc::new(MapProvider { metrics }),
        Arc::new(ListDirectory { ids }),
        Arc::clone(&store) as Arc<dyn RankingStore>,
        Arc::clone(&sink) as Arc<dyn EventSink>,
    );
    engine.agent().reseed(42);
    Fixture {
        engine,
        store,
        sink,
    }
}

pub fn vector(quality: f64, delivery: f64, price: f64, service: f64) -> MetricsVector {
    MetricsVector {
        quality: Some(quality),
        delivery_on_time_pct: Some(delivery),
        price_competitiveness: Some(price),
        service: Some(service),
        compliance: None,
    }
}
