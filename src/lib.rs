//! Gridcurb - wind curtailment ingestion and mining-potential analytics.
//!
//! Ingests per-settlement-period bid-acceptance data for monitored wind
//! units, keeps a deduplicated store of curtailment facts, maintains
//! day/month/year rollups of curtailed energy and constraint payments, and
//! estimates what the curtailed energy could have mined under several
//! Bitcoin mining hardware profiles.
//!
//! # Architecture
//!
//! - [`domain`] - Pure types and calculations: records, the curtailment
//!   filter, settlement periods, the mining potential formula
//! - [`source`] - The [`SettlementSource`](source::SettlementSource) trait
//!   the reconciler fetches through
//! - [`adapter`] - The REST source implementation and the SQLite stores
//! - [`service`] - The asset classifier, difficulty oracle, aggregation
//!   engines, and the completeness reconciler
//! - [`app`] - Wiring from [`config::Config`] to a runnable [`app::App`]
//! - [`config`] - TOML configuration loading
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use gridcurb::app::App;
//! use gridcurb::config::Config;
//!
//! # async fn run() -> gridcurb::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let app = App::from_config(&config)?;
//! let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
//! let report = app.reconcile_date(date).await?;
//! println!("complete: {}", report.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod source;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
