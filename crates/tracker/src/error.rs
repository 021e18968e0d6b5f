//! Error types for the tracking engine.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while handling a conversation or a price check.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Storage failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The chat transport rejected a send or edit.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// A button carried data this bot never produces.
    #[error("invalid callback data: {0}")]
    InvalidCallback(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
