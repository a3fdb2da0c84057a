//! Curtailment filter.
//!
//! Decides whether a raw acceptance record counts as a curtailment event.
//! Records that fail the predicate are expected noise, not errors; callers
//! discard them silently.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::ids::UnitId;
use super::period::SettlementPeriod;
use super::record::{CurtailmentRecord, RawRecord};

/// A raw record is a curtailment event iff its volume is negative, at least
/// one reason flag is set, and the unit is one we track. `owner_of` answers
/// the tracked-unit question: `None` means not tracked.
pub fn evaluate(
    date: NaiveDate,
    period: SettlementPeriod,
    raw: &RawRecord,
    owner_of: impl FnOnce(&UnitId) -> Option<String>,
) -> Option<CurtailmentRecord> {
    if raw.volume_mwh >= Decimal::ZERO {
        return None;
    }
    if !raw.has_curtailment_reason() {
        return None;
    }
    let owner = owner_of(&raw.unit_id)?;

    Some(CurtailmentRecord {
        settlement_date: date,
        settlement_period: period,
        unit_id: raw.unit_id.clone(),
        volume_mwh: raw.volume_mwh,
        owner,
        accepted_price: raw.accepted_price,
        original_price: raw.original_price,
        so_flag: raw.so_flag,
        stor_flag: raw.stor_flag,
        created_at: Utc::now(),
    })
}
