//! Curtailment facts and the raw market records they are derived from.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::UnitId;
use super::period::SettlementPeriod;

/// One raw bid-acceptance record as returned by the settlement source.
///
/// Volume is signed: negative means the unit was instructed to reduce output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub unit_id: UnitId,
    /// Signed acceptance volume in MWh.
    pub volume_mwh: Decimal,
    /// Price the acceptance settled at, GBP/MWh.
    pub accepted_price: Decimal,
    /// Price originally offered by the unit, GBP/MWh.
    pub original_price: Decimal,
    /// System-operator flag: the acceptance was taken for system reasons.
    pub so_flag: bool,
    /// Short-term operating reserve flag.
    pub stor_flag: bool,
}

impl RawRecord {
    /// Whether the reason flags mark this acceptance as grid-instructed.
    pub fn has_curtailment_reason(&self) -> bool {
        self.so_flag || self.stor_flag
    }
}

/// One stored curtailment fact, unique on (date, period, unit).
///
/// Volume is kept signed at rest; aggregates take the absolute value.
#[derive(Debug, Clone, PartialEq)]
pub struct CurtailmentRecord {
    pub settlement_date: NaiveDate,
    pub settlement_period: SettlementPeriod,
    pub unit_id: UnitId,
    pub volume_mwh: Decimal,
    pub owner: String,
    pub accepted_price: Decimal,
    pub original_price: Decimal,
    pub so_flag: bool,
    pub stor_flag: bool,
    pub created_at: DateTime<Utc>,
}

impl CurtailmentRecord {
    /// Curtailed energy magnitude in MWh.
    pub fn energy_mwh(&self) -> Decimal {
        self.volume_mwh.abs()
    }

    /// Constraint payment for this record, GBP.
    pub fn payment(&self) -> Decimal {
        self.energy_mwh() * self.original_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(volume: Decimal, original_price: Decimal) -> CurtailmentRecord {
        CurtailmentRecord {
            settlement_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            settlement_period: SettlementPeriod::new(16).unwrap(),
            unit_id: UnitId::new("T_WHILW-1"),
            volume_mwh: volume,
            owner: "Whitelee Windfarm Ltd".into(),
            accepted_price: dec!(-5.00),
            original_price,
            so_flag: true,
            stor_flag: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn energy_is_absolute_value_of_signed_volume() {
        let r = record(dec!(-42.5), dec!(7.20));
        assert_eq!(r.energy_mwh(), dec!(42.5));
    }

    #[test]
    fn payment_uses_original_offered_price() {
        let r = record(dec!(-42.5), dec!(7.20));
        assert_eq!(r.payment(), dec!(306.000));
    }
}
