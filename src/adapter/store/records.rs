//! SQLite-backed curtailment record store.
//!
//! One row per (settlement date, period, unit). Upserts are last-write-wins
//! via `replace_into`, which is what makes re-ingestion of a period
//! idempotent no matter how many times the reconciler retries it.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use diesel::prelude::*;

use super::model::{
    date_from_text, datetime_from_text, decimal_from_text, period_from_db, CurtailmentRow,
};
use super::schema::curtailment_records;
use super::DbPool;
use crate::domain::{CurtailmentRecord, SettlementPeriod, UnitId};
use crate::error::{Error, Result};

/// Durable, deduplicated storage of curtailment facts.
#[derive(Clone)]
pub struct CurtailmentStore {
    pool: DbPool,
}

impl CurtailmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(record: &CurtailmentRecord) -> CurtailmentRow {
        CurtailmentRow {
            settlement_date: record.settlement_date.to_string(),
            settlement_period: i32::from(record.settlement_period.index()),
            unit_id: record.unit_id.to_string(),
            volume_mwh: record.volume_mwh.to_string(),
            owner: record.owner.clone(),
            accepted_price: record.accepted_price.to_string(),
            original_price: record.original_price.to_string(),
            so_flag: record.so_flag,
            stor_flag: record.stor_flag,
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn from_row(row: CurtailmentRow) -> Result<CurtailmentRecord> {
        Ok(CurtailmentRecord {
            settlement_date: date_from_text(&row.settlement_date)?,
            settlement_period: period_from_db(row.settlement_period)?,
            unit_id: UnitId::new(row.unit_id),
            volume_mwh: decimal_from_text(&row.volume_mwh)?,
            owner: row.owner,
            accepted_price: decimal_from_text(&row.accepted_price)?,
            original_price: decimal_from_text(&row.original_price)?,
            so_flag: row.so_flag,
            stor_flag: row.stor_flag,
            created_at: datetime_from_text(&row.created_at)?,
        })
    }

    /// Insert or overwrite the fact for this record's (date, period, unit).
    pub fn upsert(&self, record: &CurtailmentRecord) -> Result<()> {
        let row = Self::to_row(record);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(curtailment_records::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Settlement periods of the date that already hold at least one record.
    pub fn list_periods(&self, date: NaiveDate) -> Result<BTreeSet<SettlementPeriod>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let periods: Vec<i32> = curtailment_records::table
            .filter(curtailment_records::settlement_date.eq(date.to_string()))
            .select(curtailment_records::settlement_period)
            .distinct()
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        periods.into_iter().map(period_from_db).collect()
    }

    /// All curtailment facts stored for a date.
    pub fn records_for_date(&self, date: NaiveDate) -> Result<Vec<CurtailmentRecord>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<CurtailmentRow> = curtailment_records::table
            .filter(curtailment_records::settlement_date.eq(date.to_string()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(Self::from_row).collect()
    }

    /// Remove every record for a date. Explicit reprocessing flows only.
    pub fn delete_for_date(&self, date: NaiveDate) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::delete(
            curtailment_records::table
                .filter(curtailment_records::settlement_date.eq(date.to_string())),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// Remove the records of one period of a date. Explicit reprocessing only.
    pub fn delete_for_period(&self, date: NaiveDate, period: SettlementPeriod) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::delete(
            curtailment_records::table
                .filter(curtailment_records::settlement_date.eq(date.to_string()))
                .filter(curtailment_records::settlement_period.eq(i32::from(period.index()))),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::memory_pool;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn setup_test_db() -> DbPool {
        memory_pool()
    }

    fn record(period: u8, unit: &str, volume: rust_decimal::Decimal) -> CurtailmentRecord {
        CurtailmentRecord {
            settlement_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            settlement_period: SettlementPeriod::new(period).unwrap(),
            unit_id: UnitId::new(unit),
            volume_mwh: volume,
            owner: "Test Wind Ltd".into(),
            accepted_price: dec!(-5.0),
            original_price: dec!(7.20),
            so_flag: true,
            stor_flag: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn upsert_round_trip() {
        let store = CurtailmentStore::new(setup_test_db());
        let r = record(16, "T_WHILW-1", dec!(-42.5));
        store.upsert(&r).unwrap();

        let loaded = store.records_for_date(r.settlement_date).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].volume_mwh, dec!(-42.5));
        assert_eq!(loaded[0].owner, "Test Wind Ltd");
    }

    #[test]
    fn upsert_same_key_overwrites_instead_of_duplicating() {
        let store = CurtailmentStore::new(setup_test_db());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store.upsert(&record(16, "T_WHILW-1", dec!(-10))).unwrap();
        store.upsert(&record(16, "T_WHILW-1", dec!(-42.5))).unwrap();

        let loaded = store.records_for_date(date).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].volume_mwh, dec!(-42.5));
    }

    #[test]
    fn list_periods_is_distinct_per_period() {
        let store = CurtailmentStore::new(setup_test_db());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store.upsert(&record(16, "T_WHILW-1", dec!(-1))).unwrap();
        store.upsert(&record(16, "T_GDSTW-2", dec!(-2))).unwrap();
        store.upsert(&record(17, "T_WHILW-1", dec!(-3))).unwrap();

        let periods = store.list_periods(date).unwrap();
        let indices: Vec<u8> = periods.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![16, 17]);
    }

    #[test]
    fn delete_for_date_scopes_to_that_date() {
        let store = CurtailmentStore::new(setup_test_db());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let other = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();

        store.upsert(&record(16, "T_WHILW-1", dec!(-1))).unwrap();
        let mut next_day = record(16, "T_WHILW-1", dec!(-2));
        next_day.settlement_date = other;
        store.upsert(&next_day).unwrap();

        assert_eq!(store.delete_for_date(date).unwrap(), 1);
        assert!(store.records_for_date(date).unwrap().is_empty());
        assert_eq!(store.records_for_date(other).unwrap().len(), 1);
    }

    #[test]
    fn delete_for_period_leaves_other_periods() {
        let store = CurtailmentStore::new(setup_test_db());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store.upsert(&record(16, "T_WHILW-1", dec!(-1))).unwrap();
        store.upsert(&record(17, "T_WHILW-1", dec!(-2))).unwrap();

        let p16 = SettlementPeriod::new(16).unwrap();
        assert_eq!(store.delete_for_period(date, p16).unwrap(), 1);
        let periods = store.list_periods(date).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods.iter().next().unwrap().index(), 17);
    }
}
