//! Error types for the RFM Insights client core.

use thiserror::Error;

/// Errors raised while persisting or reading the session credential.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold valid JSON.
    #[error("credential storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the backend API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the session token.
    #[error("session expired or invalid")]
    Unauthorized,

    /// Any other non-2xx response.
    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The stored credential could not be read or cleared.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors in environment-provided configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The API base URL is not an absolute http(s) URL.
    #[error("invalid API base URL: {0}")]
    InvalidUrl(String),

    /// A numeric setting could not be parsed.
    #[error("invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
}
