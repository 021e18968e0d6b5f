//! Infallible capability traits consumed by the bot.

use async_trait::async_trait;
use tracing::warn;

use crate::client::TravelpayoutsClient;
use crate::types::{FareOffer, FareRequest};

/// Resolves a city name to an IATA code.
#[async_trait]
pub trait CityResolver: Send + Sync {
    /// The city code, or `None` when the name is unknown or the lookup failed.
    async fn resolve_city(&self, name: &str) -> Option<String>;
}

/// Fetches cheapest fares.
#[async_trait]
pub trait FareSource: Send + Sync {
    /// Offers in the source's own order; empty on any failure.
    async fn fetch_fares(&self, request: &FareRequest) -> Vec<FareOffer>;
}

#[async_trait]
impl CityResolver for TravelpayoutsClient {
    async fn resolve_city(&self, name: &str) -> Option<String> {
        match self.city_code(name).await {
            Ok(code) => code,
            Err(e) => {
                warn!("City lookup for '{}' failed: {}", name, e);
                None
            }
        }
    }
}

#[async_trait]
impl FareSource for TravelpayoutsClient {
    async fn fetch_fares(&self, request: &FareRequest) -> Vec<FareOffer> {
        match self.prices_for_dates(request).await {
            Ok(offers) => offers,
            Err(e) => {
                warn!(
                    "Fare lookup {} -> {} on {} failed: {}",
                    request.origin, request.destination, request.departure, e
                );
                Vec::new()
            }
        }
    }
}
