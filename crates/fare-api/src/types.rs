//! Request and offer types, plus parsing of the raw API payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FareApiError;

/// One cheapest-fares query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareRequest {
    /// Origin IATA code.
    pub origin: String,
    /// Destination IATA code.
    pub destination: String,
    /// Departure day (`YYYY-MM-DD`) or month (`YYYY-MM`).
    pub departure: String,
    /// Currency code, any case.
    pub currency: String,
    /// Only non-stop flights.
    pub direct: bool,
}

impl FareRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure: impl Into<String>,
        currency: impl Into<String>,
        direct: bool,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure: departure.into(),
            currency: currency.into(),
            direct,
        }
    }

    /// Same query with a different direct-only flag.
    pub fn with_direct(&self, direct: bool) -> Self {
        Self {
            direct,
            ..self.clone()
        }
    }
}

/// One priced itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareOffer {
    /// Per-passenger price in the requested currency.
    pub price: i64,
    /// Marketing airline IATA code.
    pub airline: String,
    /// Departure time in the airport's offset.
    pub departure_at: DateTime<FixedOffset>,
    /// Departure day, local to the airport.
    pub departure_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<PricesData>,
    #[serde(default)]
    error: Option<String>,
}

/// `data` comes back either as a list or keyed by an opaque string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PricesData {
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Deserialize)]
struct RawFare {
    price: Option<f64>,
    #[serde(default)]
    airline: Option<String>,
    departure_at: Option<String>,
}

impl RawFare {
    fn into_offer(self) -> Option<FareOffer> {
        let price = self.price.filter(|p| p.is_finite() && *p > 0.0)?;
        let departure_at = DateTime::parse_from_rfc3339(&self.departure_at?).ok()?;
        let departure_date = departure_at.date_naive();

        Some(FareOffer {
            price: price.round() as i64,
            airline: self.airline.unwrap_or_default(),
            departure_at,
            departure_date,
        })
    }
}

/// Parse a `prices_for_dates` body into offers, keeping the API's order.
///
/// Items that do not carry a usable price and departure are skipped.
pub(crate) fn parse_prices(body: &str) -> Result<Vec<FareOffer>, FareApiError> {
    let response: PricesResponse = serde_json::from_str(body)?;

    if !response.success {
        return Err(FareApiError::Unsuccessful(
            response.error.unwrap_or_else(|| "success=false".to_string()),
        ));
    }

    let items = match response.data {
        Some(PricesData::List(items)) => items,
        Some(PricesData::Map(items)) => items.into_values().collect(),
        None => Vec::new(),
    };

    let total = items.len();
    let offers: Vec<FareOffer> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawFare>(item).ok())
        .filter_map(RawFare::into_offer)
        .collect();

    if offers.len() < total {
        debug!("Skipped {} malformed fare items", total - offers.len());
    }

    Ok(offers)
}

/// Take the code of the first autocomplete match.
pub(crate) fn parse_place_code(body: &str) -> Result<Option<String>, FareApiError> {
    let places: Vec<Value> = serde_json::from_str(body)?;

    Ok(places
        .first()
        .and_then(|place| place.get("code"))
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_payload() {
        let body = r#"{
            "success": true,
            "currency": "rub",
            "data": [
                {"price": 5200, "airline": "SU", "departure_at": "2030-06-10T08:15:00+03:00"},
                {"price": 4100, "airline": "DP", "departure_at": "2030-06-10T06:00:00+03:00"}
            ]
        }"#;
        let offers = parse_prices(body).unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].price, 5200);
        assert_eq!(offers[0].airline, "SU");
        assert_eq!(
            offers[1].departure_date,
            NaiveDate::from_ymd_opt(2030, 6, 10).unwrap()
        );
    }

    #[test]
    fn test_parse_map_payload() {
        let body = r#"{
            "success": true,
            "data": {
                "a": {"price": 3000, "airline": "S7", "departure_at": "2030-07-01T10:00:00+03:00"}
            }
        }"#;
        let offers = parse_prices(body).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].airline, "S7");
    }

    #[test]
    fn test_departure_keeps_airport_offset() {
        let body = r#"{
            "success": true,
            "data": [
                {"price": 900, "airline": "SU", "departure_at": "2030-06-10T01:30:00+05:00"}
            ]
        }"#;
        let offer = parse_prices(body).unwrap().remove(0);
        assert_eq!(offer.departure_at.offset().local_minus_utc(), 5 * 3600);
        assert_eq!(offer.departure_date, NaiveDate::from_ymd_opt(2030, 6, 10).unwrap());
        assert_eq!(offer.departure_at.to_rfc3339(), "2030-06-10T01:30:00+05:00");
    }

    #[test]
    fn test_malformed_items_skipped() {
        let body = r#"{
            "success": true,
            "data": [
                {"price": 5200, "airline": "SU", "departure_at": "2030-06-10T08:15:00+03:00"},
                {"airline": "SU", "departure_at": "2030-06-10T08:15:00+03:00"},
                {"price": 100, "airline": "SU"},
                {"price": 100, "airline": "SU", "departure_at": "soon"},
                "garbage"
            ]
        }"#;
        let offers = parse_prices(body).unwrap();
        assert_eq!(offers.len(), 1);
    }

    #[test]
    fn test_unsuccessful_payload() {
        let body = r#"{"success": false, "data": null, "error": "Unauthorized"}"#;
        assert!(matches!(
            parse_prices(body),
            Err(FareApiError::Unsuccessful(msg)) if msg == "Unauthorized"
        ));
    }

    #[test]
    fn test_empty_data() {
        let body = r#"{"success": true, "data": []}"#;
        assert!(parse_prices(body).unwrap().is_empty());
    }

    #[test]
    fn test_place_code() {
        let body = r#"[{"code": "MOW", "name": "Москва", "type": "city"}, {"code": "MOS"}]"#;
        assert_eq!(parse_place_code(body).unwrap(), Some("MOW".to_string()));
        assert_eq!(parse_place_code("[]").unwrap(), None);
        assert!(parse_place_code("{}").is_err());
    }

    #[test]
    fn test_with_direct() {
        let request = FareRequest::new("MOW", "AER", "2030-06-10", "RUB", true);
        let relaxed = request.with_direct(false);
        assert!(!relaxed.direct);
        assert_eq!(relaxed.origin, "MOW");
    }
}
