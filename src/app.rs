//! Application context: data-root discovery and engine wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::RankingConfig;
use crate::error::{RanqError, Result};
use crate::metrics::FileCatalog;
use crate::ranking::RankingEngine;
use crate::storage::{
    Database, SqliteEventSink, SqliteRankingStore, load_q_table, load_states, save_q_table,
    save_states,
};

pub struct AppContext {
    pub root: PathBuf,
    pub config: RankingConfig,
    pub db: Arc<Database>,
    pub robot_mode: bool,
    pub verbosity: u8,
    suppliers_path: PathBuf,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = match &cli.root {
            Some(root) => root.clone(),
            None => Self::find_root()?,
        };
        let config = RankingConfig::load(cli.config.as_deref(), &root)?;
        let db = Arc::new(Database::open(root.join("ranq.db"))?);
        let suppliers_path = cli
            .suppliers
            .clone()
            .unwrap_or_else(|| root.join("suppliers.json"));

        Ok(Self {
            root,
            config,
            db,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
            suppliers_path,
        })
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("RANQ_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ".ranq") {
            return Ok(found);
        }
        dirs::data_dir()
            .map(|d| d.join("ranq"))
            .ok_or_else(|| RanqError::Config("could not determine a data root".to_string()))
    }

    /// Build the ranking engine, rehydrating the Q-table and state
    /// registry from the database.
    pub fn engine(&self) -> Result<RankingEngine> {
        let catalog = Arc::new(FileCatalog::load(&self.suppliers_path)?);
        let store = Arc::new(SqliteRankingStore::new(Arc::clone(&self.db)));
        let events = Arc::new(SqliteEventSink::new(Arc::clone(&self.db)));

        let engine = RankingEngine::new(
            self.config.clone(),
            catalog.clone(),
            catalog,
            store,
            events,
        );
        engine.qtable().load_rows(load_q_table(&self.db)?);
        engine.registry().load(load_states(&self.db)?);
        Ok(engine)
    }

    /// Flush learned artifacts back to the database.
    pub fn flush(&self, engine: &RankingEngine) -> Result<()> {
        save_q_table(&self.db, engine.qtable())?;
        save_states(&self.db, engine.registry())?;
        Ok(())
    }
}

fn find_upwards(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(marker);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_upwards_locates_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".ranq");
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_upwards(&nested, ".ranq"), Some(root));
        assert_eq!(find_upwards(dir.path(), ".missing"), None);
    }
}
