use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised by the settlement source adapter.
///
/// The reconciler inspects the variant to pick a backoff: rate limiting gets
/// a longer floor than a plain transient failure.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transient fetch failure: {0}")]
    Transient(String),

    #[error("rate limited by upstream{}", retry_after_ms.map(|ms| format!(" (retry after {ms}ms)")).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether this failure signals upstream rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Reference data missing for a date. Never substituted with a default:
    /// a silent default would corrupt every derived figure for that date.
    #[error("{what} not found for {key}")]
    NotFound { what: &'static str, key: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build the `NotFound` raised when no difficulty epoch covers a date.
    pub fn difficulty_not_found(date: chrono::NaiveDate) -> Self {
        Error::NotFound {
            what: "difficulty record",
            key: date.to_string(),
        }
    }
}
