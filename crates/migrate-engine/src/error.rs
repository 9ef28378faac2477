//! Error types for migration operations.

use thiserror::Error;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A repository URL had no network location, or could not be parsed into
    /// at least two path segments where the provider requires them.
    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    /// `interval_minutes` was zero or negative.
    #[error("invalid schedule interval: {0}")]
    InvalidInterval(String),

    /// A metadata action was requested between providers/hosts this engine
    /// cannot talk to (e.g. a self-hosted Bitbucket Server).
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A provider REST call returned an HTTP status >= 400.
    #[error("{method} {url} failed with {status}: {snippet}")]
    ProviderApiError {
        method: String,
        url: String,
        status: u16,
        snippet: String,
    },

    /// The external `git` binary exited non-zero.
    #[error("Git command failed: {0}")]
    GitCommandError(String),

    /// Any other failure, already redacted by the time it reaches here.
    #[error("{0}")]
    InternalError(String),

    /// Transport-level failure talking to a provider (DNS, TLS, connect).
    #[error("network error: {0}")]
    NetworkError(String),

    /// A response body failed to parse as the expected JSON shape.
    #[error("response parsing error: {0}")]
    JsonError(String),

    /// Filesystem failure that was not eligible for silent cleanup handling.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for MigrationError {
    fn from(err: reqwest::Error) -> Self {
        MigrationError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::JsonError(err.to_string())
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;
