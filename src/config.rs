//! Configuration loading from TOML files.
//!
//! All tunables for the reconciler's self-imposed rate limiting live here so
//! operators can loosen or tighten them without a rebuild.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub api_url: String,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

/// Retry and batching knobs for the completeness reconciler.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Periods fetched concurrently within one batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches. A deliberate self-imposed rate limit against
    /// the upstream API, not a correctness requirement.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Fetch attempts per period before the date is declared incomplete.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Backoff floor applied when the upstream signals rate limiting.
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    /// Wall-clock budget for one reconciliation pass. A pass that exceeds it
    /// terminates as incomplete rather than running indefinitely.
    #[serde(default = "default_pass_timeout_ms")]
    pub pass_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    4
}

fn default_batch_delay_ms() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    250
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_rate_limit_backoff_ms() -> u64 {
    5_000
}

fn default_pass_timeout_ms() -> u64 {
    600_000
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            pass_timeout_ms: default_pass_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl ReconcilerConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn pass_timeout(&self) -> Duration {
        Duration::from_millis(self.pass_timeout_ms)
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url",
            }
            .into());
        }
        if self.source.api_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "source.api_url",
            }
            .into());
        }
        if self.reconciler.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconciler.batch_size",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.reconciler.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconciler.max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.reconciler.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "reconciler.backoff_multiplier",
                reason: "must be >= 1.0".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize the global tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.logging.level.clone()));

        if self.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "gridcurb.db".into(),
            },
            source: SourceConfig {
                api_url: "https://data.elexon.co.uk/bmrs/api/v1".into(),
                fetch_timeout_ms: default_fetch_timeout_ms(),
            },
            reconciler: ReconcilerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
