//! REST settlement source adapter.
//!
//! Fetches bid-acceptance records from the market data API. Pure I/O
//! boundary: maps HTTP failures onto the fetch error taxonomy and hands the
//! rows straight to the caller, no filtering or retries here.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{RawRecord, SettlementPeriod, UnitId};
use crate::error::{FetchError, Result};
use crate::source::SettlementSource;

/// HTTP client for the settlement data REST API.
pub struct RestSettlementSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AcceptancesResponse {
    data: Option<Vec<AcceptanceDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptanceDto {
    bm_unit: String,
    volume: Decimal,
    accepted_price: Decimal,
    original_price: Decimal,
    so_flag: bool,
    stor_flag: bool,
}

impl From<AcceptanceDto> for RawRecord {
    fn from(dto: AcceptanceDto) -> Self {
        RawRecord {
            unit_id: UnitId::new(dto.bm_unit),
            volume_mwh: dto.volume,
            accepted_price: dto.accepted_price,
            original_price: dto.original_price,
            so_flag: dto.so_flag,
            stor_flag: dto.stor_flag,
        }
    }
}

impl RestSettlementSource {
    /// Create a new source against the given API base URL.
    pub fn new(base_url: String, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn classify(err: reqwest::Error) -> FetchError {
        // Connection and timeout failures are retryable; anything else that
        // reqwest raises at transport level is treated the same way.
        FetchError::Transient(err.to_string())
    }

    fn retry_after_ms(response: &reqwest::Response) -> Option<u64> {
        response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000)
    }
}

#[async_trait]
impl SettlementSource for RestSettlementSource {
    async fn fetch(
        &self,
        date: NaiveDate,
        period: SettlementPeriod,
    ) -> std::result::Result<Vec<RawRecord>, FetchError> {
        let url = format!(
            "{}/balancing/acceptances?settlementDate={}&settlementPeriod={}",
            self.base_url,
            date,
            period.index()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::classify)?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after_ms: Self::retry_after_ms(&response),
            });
        }
        if !response.status().is_success() {
            return Err(FetchError::Transient(format!(
                "upstream returned {}",
                response.status()
            )));
        }

        let body: AcceptancesResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let records: Vec<RawRecord> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(RawRecord::from)
            .collect();

        debug!(date = %date, period = period.index(), count = records.len(), "Fetched acceptances");

        Ok(records)
    }
}
