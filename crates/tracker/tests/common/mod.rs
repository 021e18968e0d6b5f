//! Shared fixtures for the tracker integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate};
use database::{user, Database, User};
use fare_api::{CityResolver, FareOffer, FareRequest, FareSource};
use tracker::{
    seed_reference_data, Catalog, Conversation, FareLookup, InboundEvent, RecordingSender,
    TrackerConfig, Translator,
};

/// Knows Moscow and Sochi in both languages.
pub struct StaticCities;

#[async_trait]
impl CityResolver for StaticCities {
    async fn resolve_city(&self, name: &str) -> Option<String> {
        match name {
            "moscow" | "москва" => Some("MOW".to_string()),
            "sochi" | "сочи" => Some("AER".to_string()),
            _ => None,
        }
    }
}

/// Answers every request with a single SU offer at the current price, or
/// nothing when the price is unset.
#[derive(Default)]
pub struct ScriptedFares {
    price: Mutex<Option<i64>>,
    requests: Mutex<Vec<FareRequest>>,
}

impl ScriptedFares {
    pub fn with_price(price: i64) -> Arc<Self> {
        let fares = Self::default();
        fares.set_price(Some(price));
        Arc::new(fares)
    }

    pub fn set_price(&self, price: Option<i64>) {
        *self.price.lock().unwrap() = price;
    }

    pub fn requests(&self) -> Vec<FareRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FareSource for ScriptedFares {
    async fn fetch_fares(&self, request: &FareRequest) -> Vec<FareOffer> {
        self.requests.lock().unwrap().push(request.clone());
        let Some(price) = *self.price.lock().unwrap() else {
            return Vec::new();
        };
        let departure_date = NaiveDate::parse_from_str(&request.departure, "%Y-%m-%d").unwrap();
        vec![FareOffer {
            price,
            airline: "SU".to_string(),
            departure_at: DateTime::parse_from_rfc3339(&format!(
                "{}T10:15:00+03:00",
                request.departure
            ))
            .unwrap(),
            departure_date,
        }]
    }
}

/// Migrated in-memory database with reference data seeded.
pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    seed_reference_data(&db).await.unwrap();
    db
}

pub fn lookup_with(fares: Arc<ScriptedFares>) -> FareLookup {
    FareLookup::new(Arc::new(StaticCities), fares)
}

/// A day comfortably in the future.
pub fn days_ahead(days: i64) -> NaiveDate {
    Local::now().date_naive() + Duration::days(days)
}

pub struct Harness {
    pub db: Database,
    pub sender: RecordingSender,
    pub fares: Arc<ScriptedFares>,
    pub translator: Arc<Translator>,
    pub conversation: Conversation,
}

impl Harness {
    pub async fn new(price: i64) -> Self {
        let db = test_db().await;
        let sender = RecordingSender::new();
        let fares = ScriptedFares::with_price(price);
        let translator = Arc::new(Translator::load(&db).await.unwrap());
        let catalog = Arc::new(Catalog::load(&db).await.unwrap());

        let conversation = Conversation::new(
            db.clone(),
            Arc::new(sender.clone()),
            lookup_with(fares.clone()),
            translator.clone(),
            catalog,
            TrackerConfig::default(),
        );

        Self {
            db,
            sender,
            fares,
            translator,
            conversation,
        }
    }

    pub async fn text(&self, chat_id: i64, text: &str) {
        self.conversation
            .handle(InboundEvent::text(chat_id, text))
            .await
            .unwrap();
    }

    pub async fn press(&self, chat_id: i64, message_id: i64, data: &str) {
        self.conversation
            .handle(InboundEvent::callback(chat_id, "cb", message_id, data))
            .await
            .unwrap();
    }

    /// Register the chat by picking a language, then forget the replies.
    pub async fn register(&self, chat_id: i64, lang: &str) -> User {
        self.press(chat_id, 1, &format!("lang:{}", lang)).await;
        self.sender.clear();
        user::get_by_chat_id(self.db.pool(), chat_id).await.unwrap()
    }

    pub fn last_text(&self) -> String {
        self.sender.texts().last().cloned().unwrap_or_default()
    }
}
