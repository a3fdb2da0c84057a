//! Curtailment domain logic. Pure types and pure functions; no I/O.

pub mod filter;
mod ids;
pub mod mining;
mod period;
mod record;
mod summary;

pub use ids::{ProfileName, UnitId};
pub use mining::{estimate_btc, HardwareProfile, MiningCalculation, BLOCK_REWARD_BTC};
pub use period::{SettlementPeriod, PERIODS_PER_DAY};
pub use record::{CurtailmentRecord, RawRecord};
pub use summary::{
    DailySummary, MiningDailySummary, MiningMonthlySummary, MiningYearlySummary, MonthKey,
    MonthlySummary, YearlySummary,
};
