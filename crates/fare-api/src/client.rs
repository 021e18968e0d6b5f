//! HTTP client for the Travelpayouts data and autocomplete APIs.

use std::time::Duration;

use tracing::debug;

use crate::config::FareApiConfig;
use crate::error::FareApiError;
use crate::types::{parse_place_code, parse_prices, FareOffer, FareRequest};

/// Travelpayouts API client.
///
/// Every call goes to the network; nothing is cached.
#[derive(Debug, Clone)]
pub struct TravelpayoutsClient {
    client: reqwest::Client,
    config: FareApiConfig,
}

impl TravelpayoutsClient {
    /// Create a new client.
    pub fn new(config: FareApiConfig) -> Result<Self, FareApiError> {
        let client = reqwest::Client::builder()
            .user_agent("AviaBot/1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &FareApiConfig {
        &self.config
    }

    /// Resolve a free-form city name to its IATA city code.
    pub async fn city_code(&self, name: &str) -> Result<Option<String>, FareApiError> {
        debug!("Resolving city '{}'", name);

        let response = self
            .client
            .get(&self.config.places_url)
            .query(&[
                ("term", name),
                ("locale", self.config.locale.as_str()),
                ("types[]", "city"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FareApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_place_code(&body)
    }

    /// Fetch the cheapest one-way fares for a day or month.
    ///
    /// Offers come back in the API's price order.
    pub async fn prices_for_dates(
        &self,
        request: &FareRequest,
    ) -> Result<Vec<FareOffer>, FareApiError> {
        debug!(
            "Fetching fares {} -> {} on {} (direct: {})",
            request.origin, request.destination, request.departure, request.direct
        );

        let limit = self.config.limit.to_string();
        let currency = request.currency.to_lowercase();
        let direct = request.direct.to_string();

        let response = self
            .client
            .get(&self.config.prices_url)
            .query(&[
                ("origin", request.origin.as_str()),
                ("destination", request.destination.as_str()),
                ("departure_at", request.departure.as_str()),
                ("one_way", "true"),
                ("direct", direct.as_str()),
                ("currency", currency.as_str()),
                ("sorting", "price"),
                ("limit", limit.as_str()),
                ("page", "1"),
                ("token", self.config.token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FareApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_prices(&body)
    }
}
