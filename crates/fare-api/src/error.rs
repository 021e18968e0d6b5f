//! Error types for fare lookups.

use thiserror::Error;

/// Errors that can occur when calling the fare or place APIs.
#[derive(Debug, Error)]
pub enum FareApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Non-success HTTP status.
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response parsed but flagged as unsuccessful.
    #[error("API reported failure: {0}")]
    Unsuccessful(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
