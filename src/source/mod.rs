//! Settlement source trait definition.
//!
//! The outbound port the reconciler fetches through. Implementations do no
//! retries of their own; retry policy belongs to the reconciler, which needs
//! the [`FetchError`](crate::error::FetchError) variant to pick a backoff.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{RawRecord, SettlementPeriod};
use crate::error::FetchError;

/// Fetches raw bid-acceptance records for one settlement period of one date.
///
/// An empty result is a valid answer: many periods legitimately contain no
/// acceptances at all.
#[async_trait]
pub trait SettlementSource: Send + Sync {
    async fn fetch(
        &self,
        date: NaiveDate,
        period: SettlementPeriod,
    ) -> Result<Vec<RawRecord>, FetchError>;
}
