//! Difficulty oracle: which network difficulty was effective on a date.
//!
//! Caches the (small) historical epoch table sorted newest-first. A date
//! earlier than all known history is `NotFound`, never a default: a silent
//! default would corrupt every derived mining figure for that date.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use crate::adapter::store::difficulty::{DifficultyRecord, DifficultyStore};
use crate::error::{Error, Result};

pub struct DifficultyOracle {
    store: DifficultyStore,
    cache: RwLock<Option<Arc<Vec<DifficultyRecord>>>>,
}

impl DifficultyOracle {
    pub fn new(store: DifficultyStore) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    fn epochs(&self) -> Result<Arc<Vec<DifficultyRecord>>> {
        if let Some(epochs) = self.cache.read().as_ref() {
            return Ok(epochs.clone());
        }
        let epochs = Arc::new(self.store.load_all_descending()?);
        info!(epochs = epochs.len(), "Difficulty history loaded");
        *self.cache.write() = Some(epochs.clone());
        Ok(epochs)
    }

    /// Drop the cached history; the next resolve reloads.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// The difficulty effective on `date`: the newest epoch that started at
    /// or before the end of that day.
    pub fn resolve(&self, date: NaiveDate) -> Result<Decimal> {
        let end_of_day = Utc
            .from_utc_datetime(&date.and_hms_opt(23, 59, 59).unwrap_or_default());

        let epochs = self.epochs()?;
        epochs
            .iter()
            .find(|record| record.effective_at <= end_of_day)
            .map(|record| record.difficulty)
            .ok_or_else(|| Error::difficulty_not_found(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::store::difficulty::DifficultyEntry;
    use crate::testkit::memory_pool;
    use rust_decimal_macros::dec;

    fn oracle_with_history() -> DifficultyOracle {
        let store = DifficultyStore::new(memory_pool());
        store
            .import(&[
                DifficultyEntry {
                    effective_at: "2025-01-10T08:00:00Z".parse().unwrap(),
                    difficulty: dec!(100000000000000),
                },
                DifficultyEntry {
                    effective_at: "2025-03-01T12:00:00Z".parse().unwrap(),
                    difficulty: dec!(110000000000000),
                },
            ])
            .unwrap();
        DifficultyOracle::new(store)
    }

    #[test]
    fn resolves_latest_epoch_at_or_before_date() {
        let oracle = oracle_with_history();
        let february = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let march = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        assert_eq!(oracle.resolve(february).unwrap(), dec!(100000000000000));
        assert_eq!(oracle.resolve(march).unwrap(), dec!(110000000000000));
    }

    #[test]
    fn epoch_starting_mid_day_applies_to_that_date() {
        let oracle = oracle_with_history();
        let adjustment_day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(
            oracle.resolve(adjustment_day).unwrap(),
            dec!(110000000000000)
        );
    }

    #[test]
    fn date_before_all_history_is_not_found() {
        let oracle = oracle_with_history();
        let ancient = NaiveDate::from_ymd_opt(2009, 1, 3).unwrap();
        assert!(matches!(
            oracle.resolve(ancient),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn invalidate_picks_up_new_epochs() {
        let store = DifficultyStore::new(memory_pool());
        let oracle = DifficultyOracle::new(store);
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        assert!(oracle.resolve(date).is_err());

        oracle
            .store
            .import(&[DifficultyEntry {
                effective_at: "2025-01-01T00:00:00Z".parse().unwrap(),
                difficulty: dec!(90000000000000),
            }])
            .unwrap();

        // Still the stale (empty) cache until invalidated.
        assert!(oracle.resolve(date).is_err());
        oracle.invalidate();
        assert_eq!(oracle.resolve(date).unwrap(), dec!(90000000000000));
    }
}
