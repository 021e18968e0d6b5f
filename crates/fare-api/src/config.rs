//! Configuration loaded from environment variables.

use std::env;

use crate::error::FareApiError;

/// Default endpoint for cheapest fares by date.
pub const DEFAULT_PRICES_URL: &str = "https://api.travelpayouts.com/aviasales/v3/prices_for_dates";

/// Default endpoint for place autocomplete.
pub const DEFAULT_PLACES_URL: &str = "https://autocomplete.travelpayouts.com/places2";

/// Travelpayouts client configuration.
#[derive(Debug, Clone)]
pub struct FareApiConfig {
    /// API token sent with every fare request.
    pub token: String,
    /// Fares endpoint.
    pub prices_url: String,
    /// Autocomplete endpoint.
    pub places_url: String,
    /// Locale used for city name matching.
    pub locale: String,
    /// Maximum offers requested per call.
    pub limit: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl FareApiConfig {
    /// Create a configuration with default endpoints.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            prices_url: DEFAULT_PRICES_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
            locale: "ru".to_string(),
            limit: 30,
            timeout_secs: 15,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TRAVELPAYOUTS_TOKEN` | API token | (required) |
    /// | `FARE_API_URL` | Fares endpoint | `prices_for_dates` v3 |
    /// | `PLACES_API_URL` | Autocomplete endpoint | `places2` |
    /// | `FARE_API_LOCALE` | City name locale | `ru` |
    /// | `FARE_API_LIMIT` | Offers per request | `30` |
    pub fn from_env() -> Result<Self, FareApiError> {
        let token = env::var("TRAVELPAYOUTS_TOKEN")
            .map_err(|_| FareApiError::Config("TRAVELPAYOUTS_TOKEN is required".to_string()))?;

        let mut config = Self::new(token);

        if let Ok(url) = env::var("FARE_API_URL") {
            config.prices_url = url;
        }
        if let Ok(url) = env::var("PLACES_API_URL") {
            config.places_url = url;
        }
        if let Ok(locale) = env::var("FARE_API_LOCALE") {
            config.locale = locale;
        }
        if let Ok(limit) = env::var("FARE_API_LIMIT") {
            config.limit = limit
                .parse()
                .map_err(|_| FareApiError::Config(format!("invalid FARE_API_LIMIT: {}", limit)))?;
        }

        Ok(config)
    }
}
