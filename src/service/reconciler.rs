//! Completeness reconciler.
//!
//! Drives ingestion for one settlement date until every period is accounted
//! for or the retry budget runs out. Fetches happen in small concurrent
//! batches with a pause between batches; the pause and the batch size are
//! the self-imposed rate limit against the upstream API.
//!
//! A period counts as resolved once a fetch for it succeeds, even when the
//! result is empty: many periods legitimately contain zero curtailment, and
//! re-fetching them forever would never terminate.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::adapter::store::records::CurtailmentStore;
use crate::config::ReconcilerConfig;
use crate::domain::{filter, SettlementPeriod};
use crate::error::{FetchError, Result};
use crate::service::aggregation::AggregationEngine;
use crate::service::classifier::AssetClassifier;
use crate::service::mining::MiningEngine;
use crate::source::SettlementSource;

/// Lifecycle of one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Pending,
    Fetching,
    /// Some periods resolved this pass, some still outstanding.
    PartiallyComplete,
    /// Terminal: every period of the date is accounted for.
    Complete,
    /// Terminal: retry budget or pass deadline exhausted with periods
    /// still outstanding.
    Incomplete,
}

/// What a reconciliation run achieved. Unresolved periods are reported, not
/// thrown, so callers can decide to retry later.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub date: NaiveDate,
    pub state: ReconcileState,
    pub missing_periods: Vec<SettlementPeriod>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.state == ReconcileState::Complete
    }
}

pub struct Reconciler {
    source: Arc<dyn SettlementSource>,
    records: CurtailmentStore,
    classifier: Arc<AssetClassifier>,
    aggregation: AggregationEngine,
    mining: MiningEngine,
    config: ReconcilerConfig,
    fetch_timeout: Duration,
}

/// Outcome of one batch of concurrent fetches.
struct BatchOutcome {
    resolved: Vec<SettlementPeriod>,
    failures: u32,
    rate_limited: bool,
    /// Largest `Retry-After` hint seen in this batch, milliseconds.
    retry_after_ms: Option<u64>,
    store_error: Option<crate::error::Error>,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn SettlementSource>,
        records: CurtailmentStore,
        classifier: Arc<AssetClassifier>,
        aggregation: AggregationEngine,
        mining: MiningEngine,
        config: ReconcilerConfig,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            records,
            classifier,
            aggregation,
            mining,
            config,
            fetch_timeout,
        }
    }

    /// Reconcile one settlement date end to end: fetch whatever is missing,
    /// then recompute the energy and mining rollups.
    ///
    /// A complete date always gets its daily summary, zero-valued when
    /// nothing was curtailed. An incomplete run only aggregates when stored
    /// records exist, so a date whose every fetch failed keeps no summary
    /// row at all. Store write failures and missing difficulty data surface
    /// as errors; unresolved periods surface in the report instead.
    pub async fn reconcile_date(&self, date: NaiveDate) -> Result<ReconcileReport> {
        let mut state = ReconcileState::Pending;
        debug!(date = %date, state = ?state, "State transition");
        let deadline = Instant::now() + self.config.pass_timeout();
        let snapshot = self.classifier.snapshot()?;

        // Periods already accounted for: stored rows from previous passes.
        let mut resolved: BTreeSet<SettlementPeriod> = self.records.list_periods(date)?;
        let mut missing = Self::missing_from(&resolved);

        info!(
            date = %date,
            already_present = resolved.len(),
            missing = missing.len(),
            "Reconciliation started"
        );

        let mut attempt: u32 = 0;
        let mut backoff_ms = self.config.initial_backoff_ms;

        while !missing.is_empty() && attempt < self.config.max_attempts {
            attempt += 1;
            state = ReconcileState::Fetching;
            debug!(date = %date, attempt, state = ?state, "State transition");

            let mut any_failure = false;
            let mut rate_limited = false;
            let mut retry_after_ms: Option<u64> = None;

            for batch in missing.chunks(self.config.batch_size) {
                if Instant::now() >= deadline {
                    warn!(date = %date, "Pass deadline reached, stopping between batches");
                    break;
                }

                let outcome = self.fetch_batch(date, batch, &snapshot).await;
                if let Some(err) = outcome.store_error {
                    // A failed write is a persistence problem, not a fetch
                    // problem; surfaced immediately, never retried here.
                    return Err(err);
                }
                for period in outcome.resolved {
                    resolved.insert(period);
                }
                any_failure |= outcome.failures > 0;
                rate_limited |= outcome.rate_limited;
                retry_after_ms = retry_after_ms.max(outcome.retry_after_ms);

                sleep(self.config.batch_delay()).await;
            }

            missing = Self::missing_from(&resolved);

            if missing.is_empty() {
                break;
            }
            state = ReconcileState::PartiallyComplete;
            debug!(date = %date, state = ?state, unresolved = missing.len(), "State transition");

            if Instant::now() >= deadline {
                break;
            }

            if attempt < self.config.max_attempts && any_failure {
                let pause = self.backoff(&mut backoff_ms, rate_limited, retry_after_ms);
                debug!(
                    date = %date,
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    rate_limited,
                    "Backing off before retry"
                );
                sleep(pause).await;
            }
        }

        state = if missing.is_empty() {
            ReconcileState::Complete
        } else {
            ReconcileState::Incomplete
        };

        // Rollups run on completion and whenever stored rows exist: records
        // written this pass must never leave stale caches. An incomplete run
        // that stored nothing writes no summary either, because a zero daily
        // row means "processed, nothing curtailed", not "never ingested".
        let has_records = !self.records.list_periods(date)?.is_empty();
        if state == ReconcileState::Complete || has_records {
            self.aggregation.recompute_for_date(date)?;
            self.mining.recompute_for_date(date)?;
        } else {
            debug!(date = %date, "Skipping rollups: incomplete run with no stored records");
        }

        info!(
            date = %date,
            state = ?state,
            attempts = attempt,
            missing = missing.len(),
            "Reconciliation finished"
        );

        Ok(ReconcileReport {
            date,
            state,
            missing_periods: missing,
        })
    }

    fn missing_from(resolved: &BTreeSet<SettlementPeriod>) -> Vec<SettlementPeriod> {
        SettlementPeriod::all()
            .filter(|p| !resolved.contains(p))
            .collect()
    }

    /// Fetch one batch of periods concurrently, filter, and upsert.
    async fn fetch_batch(
        &self,
        date: NaiveDate,
        batch: &[SettlementPeriod],
        snapshot: &crate::service::classifier::ClassifierSnapshot,
    ) -> BatchOutcome {
        let fetches = batch.iter().map(|&period| {
            let source = self.source.clone();
            async move {
                let result = timeout(self.fetch_timeout, source.fetch(date, period)).await;
                let result = match result {
                    Ok(inner) => inner,
                    Err(_) => Err(FetchError::Transient("fetch timed out".into())),
                };
                (period, result)
            }
        });

        let results = futures_util::future::join_all(fetches).await;

        let mut outcome = BatchOutcome {
            resolved: Vec::new(),
            failures: 0,
            rate_limited: false,
            retry_after_ms: None,
            store_error: None,
        };

        for (period, result) in results {
            match result {
                Ok(raw_records) => {
                    for raw in &raw_records {
                        let record = filter::evaluate(date, period, raw, |unit| {
                            snapshot.owner_of(unit).map(String::from)
                        });
                        if let Some(record) = record {
                            if let Err(err) = self.records.upsert(&record) {
                                outcome.store_error = Some(err);
                                return outcome;
                            }
                        }
                    }
                    // Empty results resolve the period too: zero curtailment
                    // is a valid terminal answer for a period.
                    outcome.resolved.push(period);
                }
                Err(err) => {
                    outcome.failures += 1;
                    if let FetchError::RateLimited { retry_after_ms } = &err {
                        outcome.rate_limited = true;
                        outcome.retry_after_ms = outcome.retry_after_ms.max(*retry_after_ms);
                    }
                    debug!(date = %date, period = period.index(), error = %err, "Fetch failed");
                }
            }
        }

        outcome
    }

    /// Exponential backoff with jitter; rate limiting raises the floor to
    /// the configured minimum or the upstream `Retry-After` hint, whichever
    /// is larger.
    fn backoff(
        &self,
        backoff_ms: &mut u64,
        rate_limited: bool,
        retry_after_ms: Option<u64>,
    ) -> Duration {
        let mut pause_ms = *backoff_ms;
        if rate_limited {
            let floor = retry_after_ms
                .unwrap_or(0)
                .max(self.config.rate_limit_backoff_ms);
            pause_ms = pause_ms.max(floor);
        }
        let jitter = rand::thread_rng().gen_range(0..=pause_ms / 5 + 1);
        *backoff_ms = ((*backoff_ms as f64) * self.config.backoff_multiplier) as u64;
        *backoff_ms = (*backoff_ms).min(self.config.max_backoff_ms);
        Duration::from_millis(pause_ms + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::store::summaries::SummaryStore;
    use crate::adapter::store::units::UnitStore;
    use crate::adapter::store::{difficulty::DifficultyStore, mining::MiningStore};
    use crate::service::oracle::DifficultyOracle;
    use crate::testkit::{memory_pool, MockSettlementSource};

    fn reconciler(config: ReconcilerConfig) -> Reconciler {
        let pool = memory_pool();
        let records = CurtailmentStore::new(pool.clone());
        let classifier = Arc::new(AssetClassifier::new(Arc::new(UnitStore::new(pool.clone()))));
        let aggregation =
            AggregationEngine::new(records.clone(), SummaryStore::new(pool.clone()));
        let oracle = Arc::new(DifficultyOracle::new(DifficultyStore::new(pool.clone())));
        let mining = MiningEngine::new(records.clone(), MiningStore::new(pool), oracle);
        Reconciler::new(
            Arc::new(MockSettlementSource::new()),
            records,
            classifier,
            aggregation,
            mining,
            config,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn missing_from_is_the_complement_of_resolved() {
        let mut resolved = BTreeSet::new();
        for index in [1u8, 2, 48] {
            resolved.insert(SettlementPeriod::new(index).unwrap());
        }
        let missing = Reconciler::missing_from(&resolved);
        assert_eq!(missing.len(), 45);
        assert_eq!(missing[0].index(), 3);
        assert_eq!(missing.last().unwrap().index(), 47);
    }

    #[test]
    fn missing_from_full_set_is_empty() {
        let resolved: BTreeSet<_> = SettlementPeriod::all().collect();
        assert!(Reconciler::missing_from(&resolved).is_empty());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let config = ReconcilerConfig {
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
            backoff_multiplier: 2.0,
            rate_limit_backoff_ms: 5_000,
            ..ReconcilerConfig::default()
        };
        let r = reconciler(config);
        let mut backoff_ms = 100;

        let first = r.backoff(&mut backoff_ms, false, None);
        assert!(first >= Duration::from_millis(100));
        assert_eq!(backoff_ms, 200);

        r.backoff(&mut backoff_ms, false, None);
        assert_eq!(backoff_ms, 350);

        r.backoff(&mut backoff_ms, false, None);
        assert_eq!(backoff_ms, 350);
    }

    #[test]
    fn rate_limiting_raises_the_pause_floor() {
        let config = ReconcilerConfig {
            initial_backoff_ms: 10,
            rate_limit_backoff_ms: 2_000,
            ..ReconcilerConfig::default()
        };
        let r = reconciler(config);
        let mut backoff_ms = 10;

        let pause = r.backoff(&mut backoff_ms, true, None);
        assert!(pause >= Duration::from_millis(2_000));
    }

    #[test]
    fn upstream_retry_after_hint_overrides_a_smaller_floor() {
        let config = ReconcilerConfig {
            initial_backoff_ms: 10,
            rate_limit_backoff_ms: 2_000,
            ..ReconcilerConfig::default()
        };
        let r = reconciler(config);
        let mut backoff_ms = 10;

        let pause = r.backoff(&mut backoff_ms, true, Some(4_000));
        assert!(pause >= Duration::from_millis(4_000));

        // A hint below the configured floor does not lower the pause.
        let mut backoff_ms = 10;
        let pause = r.backoff(&mut backoff_ms, true, Some(5));
        assert!(pause >= Duration::from_millis(2_000));
    }
}
