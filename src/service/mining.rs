//! Mining engine: derives per-record mining estimates and rolls them up.
//!
//! Mirrors the energy aggregation engine but partitioned by hardware
//! profile. All estimates go through the one shared calculator in
//! [`crate::domain::mining`].

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::adapter::store::mining::MiningStore;
use crate::adapter::store::records::CurtailmentStore;
use crate::domain::{
    estimate_btc, HardwareProfile, MiningCalculation, MiningDailySummary, MiningMonthlySummary,
    MiningYearlySummary, MonthKey,
};
use crate::error::Result;
use crate::service::oracle::DifficultyOracle;

pub struct MiningEngine {
    records: CurtailmentStore,
    store: MiningStore,
    oracle: std::sync::Arc<DifficultyOracle>,
    profiles: Vec<HardwareProfile>,
}

impl MiningEngine {
    pub fn new(
        records: CurtailmentStore,
        store: MiningStore,
        oracle: std::sync::Arc<DifficultyOracle>,
    ) -> Self {
        Self {
            records,
            store,
            oracle,
            profiles: HardwareProfile::builtin(),
        }
    }

    /// Recompute every mining calculation and rollup for a date.
    ///
    /// Resolves the difficulty before writing anything, so a `NotFound`
    /// leaves the date without mining rows rather than half-written ones.
    pub fn recompute_for_date(&self, date: NaiveDate) -> Result<()> {
        let difficulty = self.oracle.resolve(date)?;
        let records = self.records.records_for_date(date)?;

        for record in &records {
            for profile in &self.profiles {
                let calc = MiningCalculation {
                    settlement_date: record.settlement_date,
                    settlement_period: record.settlement_period,
                    unit_id: record.unit_id.clone(),
                    profile: profile.name.clone(),
                    btc_amount: estimate_btc(record.energy_mwh(), profile, difficulty),
                    difficulty,
                };
                self.store.upsert_calculation(&calc)?;
            }
        }

        debug!(
            date = %date,
            records = records.len(),
            profiles = self.profiles.len(),
            "Mining calculations recomputed"
        );

        for profile in &self.profiles {
            self.recompute_day(date, profile)?;
            self.recompute_month(MonthKey::of(date), profile)?;
            self.recompute_year(date.year(), profile)?;
        }
        Ok(())
    }

    fn recompute_day(&self, date: NaiveDate, profile: &HardwareProfile) -> Result<()> {
        let calcs = self.store.calculations_for_date(date)?;
        let total: Decimal = calcs
            .iter()
            .filter(|c| c.profile == profile.name)
            .map(|c| c.btc_amount)
            .sum();

        self.store.put_daily(&MiningDailySummary {
            settlement_date: date,
            profile: profile.name.clone(),
            total_btc: total,
        })
    }

    fn recompute_month(&self, month: MonthKey, profile: &HardwareProfile) -> Result<()> {
        let days = self.store.daily_for_month(month, &profile.name)?;
        let total: Decimal = days.iter().map(|d| d.total_btc).sum();

        self.store.put_monthly(&MiningMonthlySummary {
            month,
            profile: profile.name.clone(),
            total_btc: total,
        })
    }

    fn recompute_year(&self, year: i32, profile: &HardwareProfile) -> Result<()> {
        let months = self.store.monthly_for_year(year, &profile.name)?;
        let total: Decimal = months.iter().map(|m| m.total_btc).sum();

        self.store.put_yearly(&MiningYearlySummary {
            year,
            profile: profile.name.clone(),
            total_btc: total,
        })
    }
}
