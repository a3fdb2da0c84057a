//! Shared harness for integration tests: a file-backed SQLite database in a
//! temp directory, seeded reference data, and a scripted settlement source.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use gridcurb::adapter::store::difficulty::{DifficultyEntry, DifficultyStore};
use gridcurb::adapter::store::mining::MiningStore;
use gridcurb::adapter::store::records::CurtailmentStore;
use gridcurb::adapter::store::summaries::SummaryStore;
use gridcurb::adapter::store::units::{TrackedUnitEntry, UnitStore};
use gridcurb::adapter::store::{create_pool, run_migrations, DbPool};
use gridcurb::config::ReconcilerConfig;
use gridcurb::domain::{RawRecord, UnitId};
use gridcurb::service::{
    AggregationEngine, AssetClassifier, DifficultyOracle, MiningEngine, Reconciler,
};
use gridcurb::source::SettlementSource;
use gridcurb::testkit::MockSettlementSource;

pub struct Harness {
    _dir: TempDir,
    pub pool: DbPool,
    pub source: Arc<MockSettlementSource>,
    pub records: CurtailmentStore,
    pub summaries: SummaryStore,
    pub mining: MiningStore,
    pub reconciler: Reconciler,
}

/// Reconciler settings tuned for tests: no pauses worth noticing, three
/// attempts, tiny backoff.
pub fn test_reconciler_config() -> ReconcilerConfig {
    ReconcilerConfig {
        batch_size: 8,
        batch_delay_ms: 1,
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        backoff_multiplier: 2.0,
        rate_limit_backoff_ms: 1,
        pass_timeout_ms: 60_000,
    }
}

/// Build a harness. `seed_difficulty: false` simulates a date before all
/// known difficulty history.
pub fn harness(seed_difficulty: bool) -> Harness {
    harness_with_config(seed_difficulty, test_reconciler_config())
}

/// Build a harness with explicit reconciler settings, for tests exercising
/// the retry and deadline knobs.
pub fn harness_with_config(seed_difficulty: bool, config: ReconcilerConfig) -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("gridcurb-test.db");
    let pool = create_pool(db_path.to_str().expect("utf-8 path")).expect("create pool");
    run_migrations(&pool).expect("run migrations");

    let units = UnitStore::new(pool.clone());
    units
        .import(&[
            TrackedUnitEntry {
                unit_id: UnitId::new("T_WHILW-1"),
                owner: "Whitelee Windfarm Ltd".into(),
            },
            TrackedUnitEntry {
                unit_id: UnitId::new("T_GDSTW-1"),
                owner: "Gordonstown Hill Ltd".into(),
            },
        ])
        .expect("seed units");

    let difficulty = DifficultyStore::new(pool.clone());
    if seed_difficulty {
        difficulty
            .import(&[DifficultyEntry {
                effective_at: "2025-01-01T00:00:00Z".parse().unwrap(),
                difficulty: dec!(110000000000000),
            }])
            .expect("seed difficulty");
    }

    let records = CurtailmentStore::new(pool.clone());
    let summaries = SummaryStore::new(pool.clone());
    let mining = MiningStore::new(pool.clone());

    let classifier = Arc::new(AssetClassifier::new(Arc::new(units)));
    let oracle = Arc::new(DifficultyOracle::new(difficulty));
    let aggregation = AggregationEngine::new(records.clone(), summaries.clone());
    let mining_engine = MiningEngine::new(records.clone(), mining.clone(), oracle);

    let source = Arc::new(MockSettlementSource::new());
    let source_dyn: Arc<dyn SettlementSource> = source.clone();

    let reconciler = Reconciler::new(
        source_dyn,
        records.clone(),
        classifier,
        aggregation,
        mining_engine,
        config,
        std::time::Duration::from_secs(2),
    );

    Harness {
        _dir: dir,
        pool,
        source,
        records,
        summaries,
        mining,
        reconciler,
    }
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

/// A curtailment-eligible raw record: negative volume, SO-flagged.
pub fn curtailed(unit: &str, volume: Decimal, original_price: Decimal) -> RawRecord {
    RawRecord {
        unit_id: UnitId::new(unit),
        volume_mwh: volume,
        accepted_price: dec!(-5.00),
        original_price,
        so_flag: true,
        stor_flag: false,
    }
}
