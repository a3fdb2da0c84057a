//! Settlement period arithmetic.
//!
//! The GB market settles in half-hour periods; a settlement day has exactly
//! 48 of them, numbered from 1.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of settlement periods in a settlement day.
pub const PERIODS_PER_DAY: u8 = 48;

/// A settlement period index, validated to `1..=PERIODS_PER_DAY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SettlementPeriod(u8);

impl SettlementPeriod {
    /// Create a settlement period, rejecting out-of-range indices.
    pub fn new(index: u8) -> Option<Self> {
        (1..=PERIODS_PER_DAY).contains(&index).then_some(Self(index))
    }

    /// The 1-based period index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Iterate over every period of a settlement day, in order.
    pub fn all() -> impl Iterator<Item = SettlementPeriod> {
        (1..=PERIODS_PER_DAY).map(SettlementPeriod)
    }
}

impl fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for SettlementPeriod {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SettlementPeriod::new(value)
            .ok_or_else(|| format!("settlement period out of range: {value}"))
    }
}

impl From<SettlementPeriod> for u8 {
    fn from(period: SettlementPeriod) -> u8 {
        period.0
    }
}
