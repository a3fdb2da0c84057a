//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::adapter::store::{create_pool_with_size, run_migrations, DbPool};
use crate::domain::{RawRecord, SettlementPeriod};
use crate::error::FetchError;
use crate::source::SettlementSource;

/// In-memory single-connection pool with migrations applied.
///
/// SQLite `:memory:` databases are per-connection, so the pool must stay at
/// size 1 or different queries would see different databases.
pub fn memory_pool() -> DbPool {
    let pool = create_pool_with_size(":memory:", 1).expect("create in-memory pool");
    run_migrations(&pool).expect("run migrations");
    pool
}

type FetchScript = VecDeque<Result<Vec<RawRecord>, FetchError>>;

/// A scripted settlement source.
///
/// Responses are queued per (date, period); each fetch pops the next entry.
/// An exhausted or missing queue answers with an empty record list, so the
/// happy path needs no scripting at all. Call counts are recorded per key
/// so tests can assert retry behaviour.
#[derive(Default)]
pub struct MockSettlementSource {
    scripts: Mutex<HashMap<(NaiveDate, u8), FetchScript>>,
    calls: Mutex<HashMap<(NaiveDate, u8), u32>>,
}

impl MockSettlementSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for a (date, period).
    pub fn push_response(
        &self,
        date: NaiveDate,
        period: u8,
        response: Result<Vec<RawRecord>, FetchError>,
    ) {
        self.scripts
            .lock()
            .entry((date, period))
            .or_default()
            .push_back(response);
    }

    /// Convenience: queue `n` transient failures for a (date, period).
    pub fn push_transient_failures(&self, date: NaiveDate, period: u8, n: usize) {
        for _ in 0..n {
            self.push_response(
                date,
                period,
                Err(FetchError::Transient("connection reset".into())),
            );
        }
    }

    pub fn call_count(&self, date: NaiveDate, period: u8) -> u32 {
        self.calls
            .lock()
            .get(&(date, period))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl SettlementSource for MockSettlementSource {
    async fn fetch(
        &self,
        date: NaiveDate,
        period: SettlementPeriod,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let key = (date, period.index());
        *self.calls.lock().entry(key).or_insert(0) += 1;

        match self.scripts.lock().get_mut(&key).and_then(VecDeque::pop_front) {
            Some(response) => response,
            None => Ok(Vec::new()),
        }
    }
}
