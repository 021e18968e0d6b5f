//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user in the system, identified by their chat identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Chat platform user identifier.
    pub chat_id: i64,
    /// Preferred language code ("ru", "en").
    pub language: String,
    /// Preferred currency code ("RUB", "USD", ...).
    pub currency: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A persisted watch request for one origin/destination/date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TrackedRoute {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Origin city as typed by the user.
    pub origin_city: String,
    /// Destination city as typed by the user.
    pub destination_city: String,
    /// Departure date in `DD-MM-YYYY` form.
    pub depart_date: String,
    /// Currency the prices are quoted in.
    pub currency: String,
    /// Notify when the price is at or below this value.
    pub notify_below_price: Option<i64>,
    /// Notify when the price drops by at least this percentage.
    pub price_drop_percent: Option<i64>,
    /// Whether the route is still being checked.
    pub active: bool,
    /// Price seen on the most recent successful check.
    pub last_checked_price: Option<i64>,
    /// Price included in the most recent notification.
    pub last_notified_price: Option<i64>,
    /// Drop magnitude included in the most recent percent notification.
    pub last_notified_percent: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
}

impl TrackedRoute {
    /// De-duplication state carried between price checks.
    pub fn check_state(&self) -> CheckState {
        CheckState {
            last_checked_price: self.last_checked_price,
            last_notified_price: self.last_notified_price,
            last_notified_percent: self.last_notified_percent,
        }
    }
}

/// Fields shared by every row of a (possibly multi-date) track request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrackedRoute {
    pub user_id: i64,
    pub origin_city: String,
    pub destination_city: String,
    pub currency: String,
    pub notify_below_price: Option<i64>,
    pub price_drop_percent: Option<i64>,
}

/// Price-check bookkeeping written back after every evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckState {
    pub last_checked_price: Option<i64>,
    pub last_notified_price: Option<i64>,
    pub last_notified_percent: Option<i64>,
}

/// An audit record of a dispatched notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Recipient user.
    pub user_id: i64,
    /// Route that triggered the notification, if any.
    pub route_id: Option<i64>,
    /// Message text as sent.
    pub message: String,
    /// When the notification was recorded.
    pub sent_at: String,
}

/// One completed fare lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SearchHistory {
    /// Auto-incrementing ID.
    pub id: i64,
    /// User who ran the search.
    pub user_id: i64,
    pub origin_city: String,
    pub destination_city: String,
    /// Departure date in `YYYY-MM-DD` form.
    pub depart_date: String,
    pub passengers: i64,
    pub direct_only: bool,
    /// When the search ran.
    pub search_time: String,
}

/// One offer returned by a recorded search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SearchResult {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning search.
    pub search_id: i64,
    pub airline_code: String,
    /// Departure date in `YYYY-MM-DD` form.
    pub departure_date: String,
    /// Per-passenger price.
    pub price: i64,
    pub currency: String,
    /// Deep link to the booking site.
    pub link: String,
}

/// A search result waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSearchResult {
    pub airline_code: String,
    pub departure_date: String,
    pub price: i64,
    pub currency: String,
    pub link: String,
}

/// Free-form feedback left by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub sent_at: String,
}

/// A selectable display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Currency {
    /// ISO code ("RUB").
    pub code: String,
    /// Display name ("Russian Ruble").
    pub name: String,
    /// Symbol ("₽").
    pub symbol: String,
    /// Flag emoji.
    pub flag: String,
}

/// Airline display names keyed by IATA code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Airline {
    pub code: String,
    pub name_ru: String,
    pub name_en: String,
}

/// A stored translation override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Translation {
    pub key: String,
    pub lang: String,
    pub value: String,
}
