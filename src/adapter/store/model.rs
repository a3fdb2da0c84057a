//! Diesel row models and the text round-trip converters shared by the stores.
//!
//! Decimal values persist as TEXT so totals survive storage exactly and
//! recomputation is bit-stable. Dates persist as ISO-8601 TEXT, which also
//! sorts correctly for range queries.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::schema::{
    curtailment_records, daily_summaries, difficulty_records, mining_calculations,
    mining_daily_summaries, mining_monthly_summaries, mining_yearly_summaries, monthly_summaries,
    tracked_units, yearly_summaries,
};
use crate::domain::SettlementPeriod;
use crate::error::{Error, Result};

pub fn decimal_from_text(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::Parse(format!("bad decimal '{s}': {e}")))
}

pub fn date_from_text(s: &str) -> Result<NaiveDate> {
    NaiveDate::from_str(s).map_err(|e| Error::Parse(format!("bad date '{s}': {e}")))
}

pub fn datetime_from_text(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("bad timestamp '{s}': {e}")))
}

pub fn period_from_db(value: i32) -> Result<SettlementPeriod> {
    u8::try_from(value)
        .ok()
        .and_then(SettlementPeriod::new)
        .ok_or_else(|| Error::Parse(format!("bad settlement period {value}")))
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = curtailment_records)]
pub struct CurtailmentRow {
    pub settlement_date: String,
    pub settlement_period: i32,
    pub unit_id: String,
    pub volume_mwh: String,
    pub owner: String,
    pub accepted_price: String,
    pub original_price: String,
    pub so_flag: bool,
    pub stor_flag: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = daily_summaries)]
pub struct DailySummaryRow {
    pub settlement_date: String,
    pub total_energy_mwh: String,
    pub total_payment: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = monthly_summaries)]
pub struct MonthlySummaryRow {
    pub year_month: String,
    pub total_energy_mwh: String,
    pub total_payment: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = yearly_summaries)]
pub struct YearlySummaryRow {
    pub year: i32,
    pub total_energy_mwh: String,
    pub total_payment: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = difficulty_records)]
pub struct DifficultyRow {
    pub effective_at: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = mining_calculations)]
pub struct MiningCalcRow {
    pub settlement_date: String,
    pub settlement_period: i32,
    pub unit_id: String,
    pub profile: String,
    pub btc_amount: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = mining_daily_summaries)]
pub struct MiningDailyRow {
    pub settlement_date: String,
    pub profile: String,
    pub total_btc: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = mining_monthly_summaries)]
pub struct MiningMonthlyRow {
    pub year_month: String,
    pub profile: String,
    pub total_btc: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = mining_yearly_summaries)]
pub struct MiningYearlyRow {
    pub year: i32,
    pub profile: String,
    pub total_btc: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = tracked_units)]
pub struct TrackedUnitRow {
    pub unit_id: String,
    pub owner: String,
}
