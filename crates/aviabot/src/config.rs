//! Configuration loaded from environment variables.

use std::env;
use std::path::Path;

use telegram_client::config::DEFAULT_API_BASE;

/// Default SQLite location.
const DEFAULT_SQLITE_PATH: &str = "./data/aviabot.db";

/// Process-level configuration. Fare API and tracking settings are read by
/// their own crates.
#[derive(Clone)]
pub struct Config {
    /// Bot token issued by BotFather.
    pub telegram_token: String,
    /// Bot API base URL.
    pub telegram_api_url: String,
    /// SQLite path or URL as given.
    pub sqlite_path: String,
    /// SQLite URL passed to the pool.
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TELEGRAM_BOT_TOKEN` | Bot token | (required) |
    /// | `TELEGRAM_API_URL` | Bot API base URL | `https://api.telegram.org` |
    /// | `SQLITE_PATH` | SQLite path or URL | `./data/aviabot.db` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingBotToken)?;

        let telegram_api_url =
            env::var("TELEGRAM_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let sqlite_path =
            env::var("SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());
        let database_url = sqlite_url_from_path(&sqlite_path);

        Ok(Self {
            telegram_token,
            telegram_api_url,
            sqlite_path,
            database_url,
        })
    }

    /// Directory that must exist before the database file can be created.
    pub fn database_dir(&self) -> Option<&Path> {
        if self.sqlite_path.starts_with("sqlite:") {
            return None;
        }
        Path::new(&self.sqlite_path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_token", &"[REDACTED]")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("database_url", &self.database_url)
            .finish()
    }
}

fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN environment variable is required")]
    MissingBotToken,
}
