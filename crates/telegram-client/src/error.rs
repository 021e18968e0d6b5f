//! Error types for telegram-client.

use thiserror::Error;

/// Errors that can occur when calling the Bot API.
#[derive(Debug, Error)]
pub enum BotError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api { code: i32, description: String },

    /// Connection to the API failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BotError {
    /// The user blocked the bot or the chat is otherwise unreachable.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, BotError::Api { code: 403, .. })
    }

    /// An edit was rejected because nothing changed.
    pub fn is_not_modified(&self) -> bool {
        matches!(
            self,
            BotError::Api { code: 400, description } if description.contains("message is not modified")
        )
    }
}
