//! Configuration types for telegram-client.

use std::fmt;

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Configuration for connecting to the Bot API.
#[derive(Clone)]
pub struct BotConfig {
    /// Base URL of the Bot API server (e.g., "https://api.telegram.org").
    pub api_base: String,
    /// Bot token issued by BotFather.
    pub token: String,
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u32,
}

impl BotConfig {
    /// Create a new configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            poll_timeout_secs: 25,
        }
    }

    /// Create configuration against a custom API server (local Bot API, test double).
    pub fn with_api_base(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            ..Self::new(token)
        }
    }

    /// Get the URL for a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// HTTP timeout that leaves room for a full long-poll round trip.
    pub fn request_timeout_secs(&self) -> u64 {
        u64::from(self.poll_timeout_secs) + 10
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}
