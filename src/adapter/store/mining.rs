//! SQLite-backed storage for mining calculations and their rollups.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;

use super::model::{
    date_from_text, decimal_from_text, period_from_db, MiningCalcRow, MiningDailyRow,
    MiningMonthlyRow, MiningYearlyRow,
};
use super::schema::{
    mining_calculations, mining_daily_summaries, mining_monthly_summaries, mining_yearly_summaries,
};
use super::DbPool;
use crate::domain::{
    MiningCalculation, MiningDailySummary, MiningMonthlySummary, MiningYearlySummary, MonthKey,
    ProfileName, UnitId,
};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct MiningStore {
    pool: DbPool,
}

impl MiningStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn calc_to_row(calc: &MiningCalculation) -> MiningCalcRow {
        MiningCalcRow {
            settlement_date: calc.settlement_date.to_string(),
            settlement_period: i32::from(calc.settlement_period.index()),
            unit_id: calc.unit_id.to_string(),
            profile: calc.profile.to_string(),
            btc_amount: calc.btc_amount.to_string(),
            difficulty: calc.difficulty.to_string(),
        }
    }

    fn calc_from_row(row: MiningCalcRow) -> Result<MiningCalculation> {
        Ok(MiningCalculation {
            settlement_date: date_from_text(&row.settlement_date)?,
            settlement_period: period_from_db(row.settlement_period)?,
            unit_id: UnitId::new(row.unit_id),
            profile: ProfileName::new(row.profile),
            btc_amount: decimal_from_text(&row.btc_amount)?,
            difficulty: decimal_from_text(&row.difficulty)?,
        })
    }

    /// Insert or overwrite the estimate for (date, period, unit, profile).
    pub fn upsert_calculation(&self, calc: &MiningCalculation) -> Result<()> {
        let row = Self::calc_to_row(calc);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(mining_calculations::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn calculations_for_date(&self, date: NaiveDate) -> Result<Vec<MiningCalculation>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<MiningCalcRow> = mining_calculations::table
            .filter(mining_calculations::settlement_date.eq(date.to_string()))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(Self::calc_from_row).collect()
    }

    /// Remove every calculation for a date. Explicit reprocessing flows only.
    pub fn delete_calculations_for_date(&self, date: NaiveDate) -> Result<usize> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::delete(
            mining_calculations::table
                .filter(mining_calculations::settlement_date.eq(date.to_string())),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))
    }

    pub fn put_daily(&self, summary: &MiningDailySummary) -> Result<()> {
        let row = MiningDailyRow {
            settlement_date: summary.settlement_date.to_string(),
            profile: summary.profile.to_string(),
            total_btc: summary.total_btc.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(mining_daily_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get_daily(
        &self,
        date: NaiveDate,
        profile: &ProfileName,
    ) -> Result<Option<MiningDailySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<MiningDailyRow> = mining_daily_summaries::table
            .find((date.to_string(), profile.to_string()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| {
            Ok(MiningDailySummary {
                settlement_date: date,
                profile: profile.clone(),
                total_btc: decimal_from_text(&r.total_btc)?,
            })
        })
        .transpose()
    }

    /// Daily mining summaries for one profile inside one month.
    pub fn daily_for_month(
        &self,
        month: MonthKey,
        profile: &ProfileName,
    ) -> Result<Vec<MiningDailySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<MiningDailyRow> = mining_daily_summaries::table
            .filter(mining_daily_summaries::profile.eq(profile.to_string()))
            .filter(mining_daily_summaries::settlement_date.ge(month.first_day().to_string()))
            .filter(
                mining_daily_summaries::settlement_date
                    .lt(month.next_month_first_day().to_string()),
            )
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                Ok(MiningDailySummary {
                    settlement_date: date_from_text(&r.settlement_date)?,
                    profile: profile.clone(),
                    total_btc: decimal_from_text(&r.total_btc)?,
                })
            })
            .collect()
    }

    pub fn put_monthly(&self, summary: &MiningMonthlySummary) -> Result<()> {
        let row = MiningMonthlyRow {
            year_month: summary.month.to_string(),
            profile: summary.profile.to_string(),
            total_btc: summary.total_btc.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(mining_monthly_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Monthly mining summaries for one profile inside one year.
    pub fn monthly_for_year(
        &self,
        year: i32,
        profile: &ProfileName,
    ) -> Result<Vec<MiningMonthlySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<MiningMonthlyRow> = mining_monthly_summaries::table
            .filter(mining_monthly_summaries::profile.eq(profile.to_string()))
            .filter(mining_monthly_summaries::year_month.ge(format!("{year:04}-01")))
            .filter(mining_monthly_summaries::year_month.le(format!("{year:04}-12")))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                let (y, m) = r
                    .year_month
                    .split_once('-')
                    .ok_or_else(|| Error::Parse(format!("bad year-month '{}'", r.year_month)))?;
                Ok(MiningMonthlySummary {
                    month: MonthKey {
                        year: y
                            .parse()
                            .map_err(|_| Error::Parse(format!("bad year '{y}'")))?,
                        month: m
                            .parse()
                            .map_err(|_| Error::Parse(format!("bad month '{m}'")))?,
                    },
                    profile: profile.clone(),
                    total_btc: decimal_from_text(&r.total_btc)?,
                })
            })
            .collect()
    }

    pub fn put_yearly(&self, summary: &MiningYearlySummary) -> Result<()> {
        let row = MiningYearlyRow {
            year: summary.year,
            profile: summary.profile.to_string(),
            total_btc: summary.total_btc.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::replace_into(mining_yearly_summaries::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn get_yearly(
        &self,
        year: i32,
        profile: &ProfileName,
    ) -> Result<Option<MiningYearlySummary>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let row: Option<MiningYearlyRow> = mining_yearly_summaries::table
            .find((year, profile.to_string()))
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        row.map(|r| {
            Ok(MiningYearlySummary {
                year: r.year,
                profile: profile.clone(),
                total_btc: decimal_from_text(&r.total_btc)?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SettlementPeriod;
    use crate::testkit::memory_pool;
    use rust_decimal_macros::dec;

    fn calc(period: u8, unit: &str, profile: &str, btc: rust_decimal::Decimal) -> MiningCalculation {
        MiningCalculation {
            settlement_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            settlement_period: SettlementPeriod::new(period).unwrap(),
            unit_id: UnitId::new(unit),
            profile: ProfileName::new(profile),
            btc_amount: btc,
            difficulty: dec!(110000000000000),
        }
    }

    #[test]
    fn calculation_upsert_is_keyed_on_profile_too() {
        let store = MiningStore::new(memory_pool());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store
            .upsert_calculation(&calc(16, "T_WHILW-1", "antminer_s9", dec!(0.001)))
            .unwrap();
        store
            .upsert_calculation(&calc(16, "T_WHILW-1", "antminer_s21", dec!(0.004)))
            .unwrap();
        // Same key as the first row: must overwrite, not duplicate.
        store
            .upsert_calculation(&calc(16, "T_WHILW-1", "antminer_s9", dec!(0.002)))
            .unwrap();

        let calcs = store.calculations_for_date(date).unwrap();
        assert_eq!(calcs.len(), 2);
        let s9 = calcs
            .iter()
            .find(|c| c.profile.as_str() == "antminer_s9")
            .unwrap();
        assert_eq!(s9.btc_amount, dec!(0.002));
    }

    #[test]
    fn daily_summary_round_trip_per_profile() {
        let store = MiningStore::new(memory_pool());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let s9 = ProfileName::new("antminer_s9");
        let s21 = ProfileName::new("antminer_s21");

        store
            .put_daily(&MiningDailySummary {
                settlement_date: date,
                profile: s9.clone(),
                total_btc: dec!(0.003),
            })
            .unwrap();

        assert_eq!(
            store.get_daily(date, &s9).unwrap().unwrap().total_btc,
            dec!(0.003)
        );
        assert!(store.get_daily(date, &s21).unwrap().is_none());
    }

    #[test]
    fn delete_calculations_scopes_to_date() {
        let store = MiningStore::new(memory_pool());
        let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        store
            .upsert_calculation(&calc(16, "T_WHILW-1", "antminer_s9", dec!(0.001)))
            .unwrap();
        let mut other = calc(16, "T_WHILW-1", "antminer_s9", dec!(0.009));
        other.settlement_date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        store.upsert_calculation(&other).unwrap();

        assert_eq!(store.delete_calculations_for_date(date).unwrap(), 1);
        assert!(store.calculations_for_date(date).unwrap().is_empty());
        assert_eq!(
            store
                .calculations_for_date(other.settlement_date)
                .unwrap()
                .len(),
            1
        );
    }
}
