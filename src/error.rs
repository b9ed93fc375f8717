//! Error types for the ASOLens CLI

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ASOLens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for backend calls, kept narrow so retries can classify failures
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Errors talking to the analysis backend
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Logical failure reported inside an otherwise successful response body
    #[error("{0}")]
    Backend(String),
}

impl ApiError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::ServerError(_) | ApiError::RateLimit(_)
        )
    }

    /// Job submission and polling retry any failure except one the backend
    /// reported in an otherwise successful body.
    pub fn is_retryable_for_jobs(&self) -> bool {
        !matches!(self, ApiError::Backend(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to analysis backend".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `asolens init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Durable cache storage errors.
///
/// The cache store absorbs these; only the `cache` commands that open the
/// storage directly ever surface one.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Database(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Terminal failures of an analysis job
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("Failed to submit analysis after {attempts} attempt(s): {source}")]
    Submission { attempts: u32, source: ApiError },

    #[error("Failed to fetch analysis status after {attempts} attempt(s): {source}")]
    Polling { attempts: u32, source: ApiError },

    #[error("Analysis failed: {0}")]
    Backend(String),

    #[error("Analysis was cancelled")]
    Cancelled,
}

impl JobError {
    /// Message suitable for showing next to the job, without the prefix.
    pub fn message(&self) -> String {
        match self {
            JobError::Backend(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Rejected analysis input
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Package name must not be empty")]
    EmptyPackageName,

    #[error("Invalid package name '{0}'. Expected something like com.example.app")]
    InvalidPackageName(String),
}
