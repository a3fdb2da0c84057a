//! Energy aggregation engine.
//!
//! Rolls curtailment records into day, month, and year summaries. Every
//! level is a full recompute from the authoritative level below, which keeps
//! totals correct after out-of-order backfills and repeated ingestion.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::adapter::store::records::CurtailmentStore;
use crate::adapter::store::summaries::SummaryStore;
use crate::domain::{DailySummary, MonthKey, MonthlySummary, YearlySummary};
use crate::error::Result;

pub struct AggregationEngine {
    records: CurtailmentStore,
    summaries: SummaryStore,
}

impl AggregationEngine {
    pub fn new(records: CurtailmentStore, summaries: SummaryStore) -> Self {
        Self {
            records,
            summaries,
        }
    }

    /// Recompute day, month, and year for a date, in that order. Each level
    /// reads the freshly written level below it.
    pub fn recompute_for_date(&self, date: NaiveDate) -> Result<()> {
        self.recompute_day(date)?;
        self.recompute_month(MonthKey::of(date))?;
        self.recompute_year(date.year())?;
        Ok(())
    }

    /// Replace the daily summary with the sum over stored records. Always
    /// writes a row, including a zero one: "processed, nothing curtailed"
    /// must be distinguishable from "never processed".
    pub fn recompute_day(&self, date: NaiveDate) -> Result<()> {
        let records = self.records.records_for_date(date)?;

        let mut total_energy = Decimal::ZERO;
        let mut total_payment = Decimal::ZERO;
        for record in &records {
            total_energy += record.energy_mwh();
            total_payment += record.payment();
        }

        debug!(
            date = %date,
            records = records.len(),
            energy_mwh = %total_energy,
            "Daily summary recomputed"
        );

        self.summaries.put_daily(&DailySummary {
            settlement_date: date,
            total_energy_mwh: total_energy,
            total_payment,
        })
    }

    /// Replace the monthly summary with the sum over the month's daily rows
    /// (not by re-summing raw records).
    pub fn recompute_month(&self, month: MonthKey) -> Result<()> {
        let days = self.summaries.daily_for_month(month)?;

        let mut total_energy = Decimal::ZERO;
        let mut total_payment = Decimal::ZERO;
        for day in &days {
            total_energy += day.total_energy_mwh;
            total_payment += day.total_payment;
        }

        self.summaries.put_monthly(&MonthlySummary {
            month,
            total_energy_mwh: total_energy,
            total_payment,
        })
    }

    /// Replace the yearly summary with the sum over the year's monthly rows.
    pub fn recompute_year(&self, year: i32) -> Result<()> {
        let months = self.summaries.monthly_for_year(year)?;

        let mut total_energy = Decimal::ZERO;
        let mut total_payment = Decimal::ZERO;
        for month in &months {
            total_energy += month.total_energy_mwh;
            total_payment += month.total_payment;
        }

        self.summaries.put_yearly(&YearlySummary {
            year,
            total_energy_mwh: total_energy,
            total_payment,
        })
    }
}
