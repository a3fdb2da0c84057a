//! Mining hardware profiles and the mining potential calculation.
//!
//! The conversion from curtailed energy to estimated mined BTC lives here and
//! only here. Every call site shares this one function; a second
//! implementation of the formula is a bug.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::ids::{ProfileName, UnitId};
use super::period::SettlementPeriod;

/// Block subsidy, BTC. Current epoch (post April 2024 halving).
pub const BLOCK_REWARD_BTC: Decimal = dec!(3.125);

/// Joules per megawatt-hour.
const JOULES_PER_MWH: Decimal = dec!(3600000000);

/// Hashes per terahash.
const HASHES_PER_TH: Decimal = dec!(1000000000000);

/// 2^32: expected hashes per difficulty-1 share.
const SHARE_SPACE: Decimal = dec!(4294967296);

/// A named mining-hardware specification.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareProfile {
    pub name: ProfileName,
    /// Hash rate in TH/s.
    pub hash_rate_ths: Decimal,
    /// Power draw in watts.
    pub power_draw_w: Decimal,
}

impl HardwareProfile {
    pub fn new(name: impl Into<ProfileName>, hash_rate_ths: Decimal, power_draw_w: Decimal) -> Self {
        Self {
            name: name.into(),
            hash_rate_ths,
            power_draw_w,
        }
    }

    /// The built-in profile catalogue. Static data; no persistence lifecycle.
    pub fn builtin() -> Vec<HardwareProfile> {
        vec![
            HardwareProfile::new("antminer_s9", dec!(13.5), dec!(1323)),
            HardwareProfile::new("antminer_s19_pro", dec!(110), dec!(3250)),
            HardwareProfile::new("antminer_s21", dec!(200), dec!(3500)),
        ]
    }

    /// Look up a built-in profile by name.
    pub fn find(name: &ProfileName) -> Option<HardwareProfile> {
        Self::builtin().into_iter().find(|p| &p.name == name)
    }
}

/// Estimated BTC mined by running `profile` for the time it would take to
/// consume `energy_mwh` at the profile's power draw, at the given difficulty.
///
/// Pure and deterministic: identical inputs give bit-identical output.
pub fn estimate_btc(energy_mwh: Decimal, profile: &HardwareProfile, difficulty: Decimal) -> Decimal {
    let joules = energy_mwh * JOULES_PER_MWH;
    let seconds = joules / profile.power_draw_w;
    let hashes = seconds * profile.hash_rate_ths * HASHES_PER_TH;
    let expected_blocks = hashes / (difficulty * SHARE_SPACE);
    expected_blocks * BLOCK_REWARD_BTC
}

/// One derived mining estimate, unique on (date, period, unit, profile).
///
/// Recomputable at will: it is a deterministic function of the corresponding
/// curtailment record and the difficulty effective on its date.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningCalculation {
    pub settlement_date: NaiveDate,
    pub settlement_period: SettlementPeriod,
    pub unit_id: UnitId,
    pub profile: ProfileName,
    pub btc_amount: Decimal,
    pub difficulty: Decimal,
}
