//! Search history: recording completed lookups and rendering `/history`.

use database::{search_history, Database, NewSearchResult, SearchHistory, SearchResult};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::fares::{FareQuery, LookupResult, ResolvedRoute};
use crate::format::{api_date, dotted_date, local_timestamp};
use crate::i18n::{plural_passenger, Lang, Translator};
use crate::links::booking_link;

/// Writes search history rows after a reply has gone out.
///
/// Every failure is logged and swallowed.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    db: Database,
}

impl HistoryRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record one completed lookup and its rendered offers.
    ///
    /// Returns the history row ID when the parent row was written.
    pub async fn record(
        &self,
        user_id: i64,
        route: &ResolvedRoute,
        query: &FareQuery,
        result: &LookupResult,
    ) -> Option<i64> {
        let search_id = match search_history::record_search(
            self.db.pool(),
            user_id,
            &route.origin_city,
            &route.destination_city,
            &api_date(query.date),
            i64::from(query.passengers),
            result.direct_used(query),
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to record search for user {}: {}", user_id, e);
                return None;
            }
        };

        let currency = query.currency.to_ascii_uppercase();
        for offer in result.top() {
            let row = NewSearchResult {
                airline_code: offer.airline.clone(),
                departure_date: api_date(offer.departure_date),
                price: offer.price,
                currency: currency.clone(),
                link: booking_link(
                    &route.origin_code,
                    offer.departure_date,
                    &route.destination_code,
                    query.passengers,
                ),
            };
            if let Err(e) = search_history::record_result(self.db.pool(), search_id, &row).await {
                warn!("Failed to record result for search {}: {}", search_id, e);
            }
        }

        debug!("Recorded search {} for user {}", search_id, user_id);
        Some(search_id)
    }

    /// The user's most recent searches with their stored results.
    pub async fn recent(
        &self,
        user_id: i64,
        limit: i64,
    ) -> database::Result<Vec<(SearchHistory, Vec<SearchResult>)>> {
        let searches = search_history::list_recent(self.db.pool(), user_id, limit).await?;
        let mut entries = Vec::with_capacity(searches.len());
        for search in searches {
            let results = search_history::list_results(self.db.pool(), search.id).await?;
            entries.push((search, results));
        }
        Ok(entries)
    }
}

/// Render one `/history` entry.
///
/// `results` must be ordered by price, cheapest first.
pub fn render_entry(
    search: &SearchHistory,
    results: &[SearchResult],
    utc_offset_hours: i32,
    tr: &Translator,
    catalog: &Catalog,
    lang: Lang,
) -> String {
    let passengers = u32::try_from(search.passengers).unwrap_or(1);
    let mut text = format!(
        "📅 {} ({})\n✈ {} → {} ({})\n👥 {} {}",
        local_timestamp(&search.search_time, utc_offset_hours),
        tr.t("moscow_time", lang),
        search.origin_city,
        search.destination_city,
        dotted_date(&search.depart_date),
        passengers,
        plural_passenger(passengers, lang)
    );

    if let Some(best) = results.first() {
        let kind = if search.direct_only {
            tr.t("direct", lang)
        } else {
            tr.t("with_transfers", lang)
        };
        text.push_str(&format!(
            "\n💰 {} {} | {} | {}",
            best.price * search.passengers,
            best.currency,
            catalog.airline_name(&best.airline_code, lang),
            kind
        ));
    }

    text
}
