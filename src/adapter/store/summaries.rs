//! SQLite-backed energy summary store.
//!
//! Pure derived caches: every write replaces the whole row for its key, and
//! the aggregation engine always recomputes a level from the level below.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;

use super::model::{
    date_from_text, decimal_from_text, DailySummaryRow, MonthlySummaryRow, YearlySummaryRow,
};
use super::schema::{daily_summaries, monthly_summaries, yearly_summaries};
use super::DbPool;
use crate::domain::{DailySummary, MonthKey, MonthlySummary, YearlySummary};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct SummaryStore {
    pool: DbPool,
}

impl SummaryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn put_daily(&self, summary: &DailySummary) -> Result<()> {
        let row = DailySummaryRow {
            settlement_date: summary.settlement_date.to_string(),
            total_energy_mwh: summary.total_energy_mwh.to_string(),
            total_payment: summary.total_payment.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(daily_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get_daily(&self, date: NaiveDate) -> Result<Option<DailySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<DailySummaryRow> = daily_summaries::table
            .find(date.to_string())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| {
            Ok(DailySummary {
                settlement_date: date_from_text(&r.settlement_date)?,
                total_energy_mwh: decimal_from_text(&r.total_energy_mwh)?,
                total_payment: decimal_from_text(&r.total_payment)?,
            })
        })
        .transpose()
    }

    /// Daily summaries whose date falls inside the given month.
    pub fn daily_for_month(&self, month: MonthKey) -> Result<Vec<DailySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        // ISO dates sort lexicographically, so a text range covers the month.
        let rows: Vec<DailySummaryRow> = daily_summaries::table
            .filter(daily_summaries::settlement_date.ge(month.first_day().to_string()))
            .filter(daily_summaries::settlement_date.lt(month.next_month_first_day().to_string()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                Ok(DailySummary {
                    settlement_date: date_from_text(&r.settlement_date)?,
                    total_energy_mwh: decimal_from_text(&r.total_energy_mwh)?,
                    total_payment: decimal_from_text(&r.total_payment)?,
                })
            })
            .collect()
    }

    pub fn put_monthly(&self, summary: &MonthlySummary) -> Result<()> {
        let row = MonthlySummaryRow {
            year_month: summary.month.to_string(),
            total_energy_mwh: summary.total_energy_mwh.to_string(),
            total_payment: summary.total_payment.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(monthly_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get_monthly(&self, month: MonthKey) -> Result<Option<MonthlySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<MonthlySummaryRow> = monthly_summaries::table
            .find(month.to_string())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| {
            Ok(MonthlySummary {
                month,
                total_energy_mwh: decimal_from_text(&r.total_energy_mwh)?,
                total_payment: decimal_from_text(&r.total_payment)?,
            })
        })
        .transpose()
    }

    /// Monthly summaries belonging to the given year.
    pub fn monthly_for_year(&self, year: i32) -> Result<Vec<MonthlySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<MonthlySummaryRow> = monthly_summaries::table
            .filter(monthly_summaries::year_month.ge(format!("{year:04}-01")))
            .filter(monthly_summaries::year_month.le(format!("{year:04}-12")))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                let (y, m) = r
                    .year_month
                    .split_once('-')
                    .ok_or_else(|| Error::Parse(format!("bad year-month '{}'", r.year_month)))?;
                let month = MonthKey {
                    year: y
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad year '{y}'")))?,
                    month: m
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad month '{m}'")))?,
                };
                Ok(MonthlySummary {
                    month,
                    total_energy_mwh: decimal_from_text(&r.total_energy_mwh)?,
                    total_payment: decimal_from_text(&r.total_payment)?,
                })
            })
            .collect()
    }

    pub fn put_yearly(&self, summary: &YearlySummary) -> Result<()> {
        let row = YearlySummaryRow {
            year: summary.year,
            total_energy_mwh: summary.total_energy_mwh.to_string(),
            total_payment: summary.total_payment.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(yearly_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get_yearly(&self, year: i32) -> Result<Option<YearlySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<YearlySummaryRow> = yearly_summaries::table
            .find(year)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| {
            Ok(YearlySummary {
                year: r.year,
                total_energy_mwh: decimal_from_text(&r.total_energy_mwh)?,
                total_payment: decimal_from_text(&r.total_payment)?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::memory_pool;
    use rust_decimal_macros::dec;

    #[test]
    fn daily_replace_semantics() {
        let store = SummaryStore::new(memory_pool());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store
            .put_daily(&DailySummary {
                settlement_date: date,
                total_energy_mwh: dec!(10),
                total_payment: dec!(72),
            })
            .unwrap();
        store
            .put_daily(&DailySummary {
                settlement_date: date,
                total_energy_mwh: dec!(42.5),
                total_payment: dec!(306.00),
            })
            .unwrap();

        let summary = store.get_daily(date).unwrap().unwrap();
        assert_eq!(summary.total_energy_mwh, dec!(42.5));
        assert_eq!(summary.total_payment, dec!(306.00));
    }

    #[test]
    fn daily_for_month_excludes_neighbouring_months() {
        let store = SummaryStore::new(memory_pool());
        for (y, m, d) in [(2025, 2, 28), (2025, 3, 1), (2025, 3, 31), (2025, 4, 1)] {
            store
                .put_daily(&DailySummary {
                    settlement_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                    total_energy_mwh: dec!(1),
                    total_payment: dec!(1),
                })
                .unwrap();
        }

        let march = store
            .daily_for_month(MonthKey {
                year: 2025,
                month: 3,
            })
            .unwrap();
        assert_eq!(march.len(), 2);
    }

    #[test]
    fn monthly_for_year_scopes_to_year() {
        let store = SummaryStore::new(memory_pool());
        for (year, month) in [(2024, 12), (2025, 1), (2025, 12)] {
            store
                .put_monthly(&MonthlySummary {
                    month: MonthKey { year, month },
                    total_energy_mwh: dec!(5),
                    total_payment: dec!(36),
                })
                .unwrap();
        }

        let months = store.monthly_for_year(2025).unwrap();
        assert_eq!(months.len(), 2);
        assert!(months.iter().all(|m| m.month.year == 2025));
    }

    #[test]
    fn missing_rows_are_none() {
        let store = SummaryStore::new(memory_pool());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert!(store.get_daily(date).unwrap().is_none());
        assert!(store.get_yearly(2025).unwrap().is_none());
    }
}
