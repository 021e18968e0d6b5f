//! Fare lookup with the direct-to-any fallback, and result rendering.

use std::sync::Arc;

use chrono::NaiveDate;
use fare_api::{CityResolver, FareOffer, FareRequest, FareSource};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::format::{api_date, title_case, track_date};
use crate::i18n::{Lang, Translator};
use crate::links::booking_link;

/// Offers rendered per date.
pub const MAX_RENDERED_OFFERS: usize = 5;

/// Route with both ends resolved to IATA codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// City names as typed.
    pub origin_city: String,
    pub destination_city: String,
    pub origin_code: String,
    pub destination_code: String,
}

/// One lookup on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareQuery {
    pub date: NaiveDate,
    pub currency: String,
    pub passengers: u32,
    pub direct: bool,
}

/// Offers found for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    /// Sorted by departure time; never empty.
    pub offers: Vec<FareOffer>,
    /// Direct-only found nothing and these offers include transfers.
    pub fell_back_to_transfers: bool,
}

impl LookupResult {
    /// The direct flag the offers were actually fetched with.
    pub fn direct_used(&self, query: &FareQuery) -> bool {
        query.direct && !self.fell_back_to_transfers
    }

    /// Offers that get rendered and recorded.
    pub fn top(&self) -> &[FareOffer] {
        &self.offers[..self.offers.len().min(MAX_RENDERED_OFFERS)]
    }
}

/// Fare lookup over the resolution and fare capabilities.
#[derive(Clone)]
pub struct FareLookup {
    resolver: Arc<dyn CityResolver>,
    source: Arc<dyn FareSource>,
}

impl FareLookup {
    pub fn new(resolver: Arc<dyn CityResolver>, source: Arc<dyn FareSource>) -> Self {
        Self { resolver, source }
    }

    /// Resolve both cities. `None` when either is unknown.
    pub async fn resolve_route(&self, origin: &str, destination: &str) -> Option<ResolvedRoute> {
        let origin_code = self.resolver.resolve_city(origin).await?;
        let destination_code = self.resolver.resolve_city(destination).await?;
        debug!(
            "Resolved {} -> {} as {} -> {}",
            origin, destination, origin_code, destination_code
        );

        Some(ResolvedRoute {
            origin_city: origin.to_string(),
            destination_city: destination.to_string(),
            origin_code,
            destination_code,
        })
    }

    /// Look up fares for one day.
    ///
    /// A direct-only query that finds nothing is retried once without the
    /// restriction. `None` means nothing was found either way.
    pub async fn lookup(&self, route: &ResolvedRoute, query: &FareQuery) -> Option<LookupResult> {
        let request = FareRequest::new(
            &route.origin_code,
            &route.destination_code,
            api_date(query.date),
            &query.currency,
            query.direct,
        );

        let mut offers = self.source.fetch_fares(&request).await;
        let mut fell_back_to_transfers = false;

        if offers.is_empty() && query.direct {
            info!(
                "No direct flights {} -> {} on {}, retrying with transfers",
                route.origin_code, route.destination_code, request.departure
            );
            offers = self.source.fetch_fares(&request.with_direct(false)).await;
            fell_back_to_transfers = !offers.is_empty();
        }

        if offers.is_empty() {
            return None;
        }

        // Stable: offers departing at the same moment keep the API's order.
        offers.sort_by(|a, b| a.departure_at.cmp(&b.departure_at));

        Some(LookupResult {
            offers,
            fell_back_to_transfers,
        })
    }

    /// Cheapest single-passenger price on a day, transfers allowed.
    pub async fn cheapest(&self, route: &ResolvedRoute, date: NaiveDate, currency: &str) -> Option<i64> {
        let query = FareQuery {
            date,
            currency: currency.to_string(),
            passengers: 1,
            direct: false,
        };
        self.lookup(route, &query)
            .await
            .and_then(|result| result.offers.iter().map(|offer| offer.price).min())
    }
}

/// Render one day's offers as a Markdown block.
pub fn render_offers(
    route: &ResolvedRoute,
    query: &FareQuery,
    result: &LookupResult,
    tr: &Translator,
    catalog: &Catalog,
    lang: Lang,
) -> String {
    let currency = query.currency.to_ascii_uppercase();
    let flag = catalog.flag(&currency);
    let mut text = String::new();

    if result.fell_back_to_transfers {
        text.push_str(&tr.t("no_direct_but_with_transfers", lang));
        text.push_str("\n\n");
    }

    text.push_str(&format!(
        "🎯 {} *{} → {}*\n\n",
        tr.t("route_header", lang),
        title_case(&route.origin_city),
        title_case(&route.destination_city)
    ));

    for offer in result.top() {
        let total = offer.price * i64::from(query.passengers);
        let link = booking_link(
            &route.origin_code,
            offer.departure_date,
            &route.destination_code,
            query.passengers,
        );
        text.push_str(&format!(
            "📅 *{}* — *{} {} {}* (`{}`)\n[🔗 {}]({})\n",
            track_date(offer.departure_date),
            total,
            currency,
            flag,
            catalog.airline_name(&offer.airline, lang),
            tr.t("buy_button", lang),
            link
        ));
    }

    text
}
