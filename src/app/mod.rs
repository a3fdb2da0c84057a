//! Application wiring.
//!
//! Builds the pool, stores, and services from a [`Config`] and exposes the
//! operations the CLI (or any embedding application) calls.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::adapter::store::difficulty::{DifficultyEntry, DifficultyStore};
use crate::adapter::store::mining::MiningStore;
use crate::adapter::store::records::CurtailmentStore;
use crate::adapter::store::summaries::SummaryStore;
use crate::adapter::store::units::{TrackedUnitEntry, UnitStore};
use crate::adapter::store::{create_pool, run_migrations};
use crate::adapter::RestSettlementSource;
use crate::config::Config;
use crate::domain::{DailySummary, MiningDailySummary, ProfileName};
use crate::error::Result;
use crate::service::{
    AggregationEngine, AssetClassifier, DifficultyOracle, MiningEngine, ReconcileReport,
    Reconciler,
};
use crate::source::SettlementSource;

pub struct App {
    records: CurtailmentStore,
    summaries: SummaryStore,
    mining: MiningStore,
    units: UnitStore,
    difficulty: DifficultyStore,
    classifier: Arc<AssetClassifier>,
    oracle: Arc<DifficultyOracle>,
    reconciler: Reconciler,
}

impl App {
    /// Build the full application from configuration, running migrations.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(RestSettlementSource::new(
            config.source.api_url.clone(),
            config.source.fetch_timeout(),
        )?);
        Self::with_source(config, source)
    }

    /// Build with an explicit settlement source. Tests inject mocks here.
    pub fn with_source(config: &Config, source: Arc<dyn SettlementSource>) -> Result<Self> {
        let pool = create_pool(&config.database.url)?;
        run_migrations(&pool)?;
        info!(database = %config.database.url, "Database ready");

        let records = CurtailmentStore::new(pool.clone());
        let summaries = SummaryStore::new(pool.clone());
        let mining = MiningStore::new(pool.clone());
        let units = UnitStore::new(pool.clone());
        let difficulty = DifficultyStore::new(pool);

        let classifier = Arc::new(AssetClassifier::new(Arc::new(units.clone())));
        let oracle = Arc::new(DifficultyOracle::new(difficulty.clone()));

        let aggregation = AggregationEngine::new(records.clone(), summaries.clone());
        let mining_engine =
            MiningEngine::new(records.clone(), mining.clone(), oracle.clone());

        let reconciler = Reconciler::new(
            source,
            records.clone(),
            classifier.clone(),
            aggregation,
            mining_engine,
            config.reconciler.clone(),
            config.source.fetch_timeout(),
        );

        Ok(Self {
            records,
            summaries,
            mining,
            units,
            difficulty,
            classifier,
            oracle,
            reconciler,
        })
    }

    /// Reconcile one settlement date: fetch missing periods, then recompute
    /// the energy and mining rollups.
    pub async fn reconcile_date(&self, date: NaiveDate) -> Result<ReconcileReport> {
        self.reconciler.reconcile_date(date).await
    }

    /// Wipe a date's derived and stored facts, then reconcile it afresh.
    /// The only path that deletes records.
    pub async fn reprocess_date(&self, date: NaiveDate) -> Result<ReconcileReport> {
        let removed = self.records.delete_for_date(date)?;
        let calcs = self.mining.delete_calculations_for_date(date)?;
        info!(date = %date, records = removed, calculations = calcs, "Date cleared for reprocessing");
        self.reconciler.reconcile_date(date).await
    }

    pub fn daily_summary(&self, date: NaiveDate) -> Result<Option<DailySummary>> {
        self.summaries.get_daily(date)
    }

    pub fn mining_summary(
        &self,
        date: NaiveDate,
        profile: &ProfileName,
    ) -> Result<Option<MiningDailySummary>> {
        self.mining.get_daily(date, profile)
    }

    /// Load tracked units from a JSON file and refresh the classifier.
    pub fn import_units(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<TrackedUnitEntry> = serde_json::from_str(&content)?;
        let count = self.units.import(&entries)?;
        self.classifier.invalidate();
        Ok(count)
    }

    pub fn list_units(&self) -> Result<Vec<TrackedUnitEntry>> {
        self.units.list()
    }

    /// Load difficulty epochs from a JSON file and refresh the oracle.
    pub fn import_difficulty(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<DifficultyEntry> = serde_json::from_str(&content)?;
        let count = self.difficulty.import(&entries)?;
        self.oracle.invalidate();
        Ok(count)
    }
}
