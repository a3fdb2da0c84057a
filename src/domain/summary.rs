//! Derived aggregation caches for curtailed energy and payments.
//!
//! Summaries have no independent lifecycle: each level is always fully
//! recomputed from the level below, never incrementally patched.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::ids::ProfileName;

/// Year-month key for monthly summaries, e.g. `2025-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month, for range queries.
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap())
    }

    /// First day of the following month (exclusive upper bound).
    pub fn next_month_first_day(self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_else(|| self.first_day())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Total curtailed energy and payment for one settlement date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub settlement_date: NaiveDate,
    pub total_energy_mwh: Decimal,
    pub total_payment: Decimal,
}

/// Sum of a month's daily summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub total_energy_mwh: Decimal,
    pub total_payment: Decimal,
}

/// Sum of a year's monthly summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySummary {
    pub year: i32,
    pub total_energy_mwh: Decimal,
    pub total_payment: Decimal,
}

/// Estimated mined BTC for one date under one hardware profile.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningDailySummary {
    pub settlement_date: NaiveDate,
    pub profile: ProfileName,
    pub total_btc: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MiningMonthlySummary {
    pub month: MonthKey,
    pub profile: ProfileName,
    pub total_btc: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MiningYearlySummary {
    pub year: i32,
    pub profile: ProfileName,
    pub total_btc: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_formats_with_padding() {
        let key = MonthKey::of(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(key.to_string(), "2025-03");
    }

    #[test]
    fn month_key_december_rolls_into_next_year() {
        let key = MonthKey {
            year: 2025,
            month: 12,
        };
        assert_eq!(
            key.next_month_first_day(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
        );
    }

    #[test]
    fn month_key_bounds_cover_the_month() {
        let key = MonthKey {
            year: 2025,
            month: 2,
        };
        assert_eq!(
            key.first_day(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
        );
        assert_eq!(
            key.next_month_first_day(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }
}
