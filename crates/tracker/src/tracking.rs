//! Track setup drafts, the tracked-route service and route cards.

use chrono::NaiveDate;
use database::{tracked_route, Database, DatabaseError, NewTrackedRoute, TrackedRoute, User};
use tracing::info;

use crate::callback::CallbackAction;
use crate::error::Result;
use crate::format::{title_case, track_date};
use crate::i18n::{Lang, Translator};
use crate::keyboard::{Button, Keyboard};

/// Which threshold the user is typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Price,
    Percent,
}

/// A track request being configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDraft {
    pub origin: String,
    pub destination: String,
    /// Ascending, no duplicates.
    pub dates: Vec<NaiveDate>,
    pub below_price: Option<i64>,
    pub drop_percent: Option<i64>,
}

impl TrackDraft {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, mut dates: Vec<NaiveDate>) -> Self {
        dates.sort();
        dates.dedup();
        Self {
            origin: origin.into(),
            destination: destination.into(),
            dates,
            below_price: None,
            drop_percent: None,
        }
    }

    pub fn has_threshold(&self) -> bool {
        self.below_price.is_some() || self.drop_percent.is_some()
    }

    pub fn set(&mut self, kind: ThresholdKind, value: i64) {
        match kind {
            ThresholdKind::Price => self.below_price = Some(value),
            ThresholdKind::Percent => self.drop_percent = Some(value),
        }
    }

    /// Setup keyboard showing the values entered so far.
    pub fn keyboard(&self, tr: &Translator, lang: Lang) -> Keyboard {
        let price_label = match self.below_price {
            Some(value) => tr.tf("track_set_price_val", lang, &[("value", &value)]),
            None => tr.t("track_set_price", lang),
        };
        let percent_label = match self.drop_percent {
            Some(value) => tr.tf("track_set_percent_val", lang, &[("value", &value)]),
            None => tr.t("track_set_percent", lang),
        };

        Keyboard::column(vec![
            Button::callback(price_label, CallbackAction::TrackPrice.data()),
            Button::callback(percent_label, CallbackAction::TrackPercent.data()),
            Button::callback(tr.t("track_save", lang), CallbackAction::TrackConfirm.data()),
            Button::callback(tr.t("track_cancel", lang), CallbackAction::TrackCancel.data()),
        ])
    }

    /// One line per threshold already set.
    pub fn summary(&self, currency: &str, tr: &Translator, lang: Lang) -> String {
        let mut lines = Vec::new();
        if let Some(value) = self.below_price {
            lines.push(tr.tf(
                "track_price_set",
                lang,
                &[("value", &value), ("currency", &currency)],
            ));
        }
        if let Some(value) = self.drop_percent {
            lines.push(tr.tf("track_percent_set", lang, &[("value", &value)]));
        }
        lines.join("\n")
    }
}

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// Missing, already inactive, or owned by someone else.
    NotFound,
}

/// Tracked-route operations on behalf of a user.
#[derive(Debug, Clone)]
pub struct TrackingService {
    db: Database,
}

impl TrackingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist one route per draft date in the user's currency.
    ///
    /// A draft without thresholds is rejected with a validation error before
    /// anything is written.
    pub async fn create(&self, user: &User, draft: &TrackDraft) -> Result<Vec<TrackedRoute>> {
        let request = NewTrackedRoute {
            user_id: user.id,
            origin_city: draft.origin.clone(),
            destination_city: draft.destination.clone(),
            currency: user.currency.clone(),
            notify_below_price: draft.below_price,
            price_drop_percent: draft.drop_percent,
        };
        let dates: Vec<String> = draft.dates.iter().copied().map(track_date).collect();

        let routes = tracked_route::create_routes(self.db.pool(), &request, &dates).await?;
        info!(
            "User {} now tracks {} -> {} on {} date(s)",
            user.id,
            draft.origin,
            draft.destination,
            routes.len()
        );
        Ok(routes)
    }

    pub async fn active(&self, user_id: i64) -> Result<Vec<TrackedRoute>> {
        Ok(tracked_route::list_active_for_user(self.db.pool(), user_id).await?)
    }

    /// Most recent routes regardless of status, newest first.
    pub async fn recent(&self, user_id: i64, limit: i64) -> Result<Vec<TrackedRoute>> {
        Ok(tracked_route::list_recent_for_user(self.db.pool(), user_id, limit).await?)
    }

    /// Deactivate a route if the user owns it and it is still active.
    pub async fn cancel(&self, user_id: i64, route_id: i64) -> Result<CancelOutcome> {
        match tracked_route::deactivate_for_user(self.db.pool(), route_id, user_id).await {
            Ok(()) => {
                info!("User {} cancelled route {}", user_id, route_id);
                Ok(CancelOutcome::Cancelled)
            }
            Err(DatabaseError::NotFound { .. }) => Ok(CancelOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Card for `/mytracks`: route, date and thresholds.
pub fn render_active_route(route: &TrackedRoute, tr: &Translator, lang: Lang) -> String {
    let mut text = format!(
        "📌 *{} → {}*\n📅 {}",
        title_case(&route.origin_city),
        title_case(&route.destination_city),
        route.depart_date
    );
    if let Some(price) = route.notify_below_price {
        text.push_str(&format!(
            "\n💰 {} ≤ {} {}",
            tr.t("track_price_label", lang),
            price,
            route.currency
        ));
    }
    if let Some(percent) = route.price_drop_percent {
        text.push_str(&format!(
            "\n📉 {} -{}%",
            tr.t("track_percent_label", lang),
            percent
        ));
    }
    text
}

/// Card for `/alltracks`: route, date and status.
pub fn render_recent_route(route: &TrackedRoute, tr: &Translator, lang: Lang) -> String {
    let status = if route.active {
        tr.t("status_active", lang)
    } else {
        tr.t("status_cancelled", lang)
    };
    format!(
        "📌 *{} → {}*\n📅 {}\n{}",
        title_case(&route.origin_city),
        title_case(&route.destination_city),
        route.depart_date,
        status
    )
}

/// Single "cancel" button for a route card.
pub fn untrack_keyboard(route_id: i64, tr: &Translator, lang: Lang) -> Keyboard {
    Keyboard::new(vec![vec![Button::callback(
        tr.t("untrack_button", lang),
        CallbackAction::Untrack(route_id).data(),
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::user;

    async fn setup() -> (Database, User, User) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let alice = user::upsert_language(db.pool(), 1, "ru", "RUB").await.unwrap();
        let bob = user::upsert_language(db.pool(), 2, "en", "USD").await.unwrap();
        (db, alice, bob)
    }

    fn draft() -> TrackDraft {
        TrackDraft::new(
            "москва",
            "сочи",
            vec![
                NaiveDate::from_ymd_opt(2030, 6, 12).unwrap(),
                NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
                NaiveDate::from_ymd_opt(2030, 6, 12).unwrap(),
            ],
        )
    }

    #[test]
    fn test_draft_dates_sorted_and_unique() {
        let draft = draft();
        assert_eq!(draft.dates.len(), 2);
        assert!(draft.dates[0] < draft.dates[1]);
        assert!(!draft.has_threshold());
    }

    #[test]
    fn test_draft_keyboard_shows_values() {
        let tr = Translator::new();
        let mut draft = draft();
        let keyboard = draft.keyboard(&tr, Lang::En);
        assert_eq!(keyboard.rows[0][0].text, "💰 Set price");

        draft.set(ThresholdKind::Price, 7000);
        draft.set(ThresholdKind::Percent, 15);
        let keyboard = draft.keyboard(&tr, Lang::En);
        assert_eq!(keyboard.rows[0][0].text, "💰 Set price (7000)");
        assert_eq!(keyboard.rows[1][0].text, "📉 Set % drop (15%)");
        assert_eq!(keyboard.rows[2][0].callback_data(), Some("track_confirm"));
        assert_eq!(keyboard.rows[3][0].callback_data(), Some("track_cancel"));

        assert_eq!(
            draft.summary("USD", &tr, Lang::En),
            "💰 Max price set: 7000 USD\n📉 Will notify if price drops by 15%"
        );
    }

    #[tokio::test]
    async fn test_create_fans_out_in_user_currency() {
        let (db, _, bob) = setup().await;
        let service = TrackingService::new(db);
        let mut draft = draft();
        draft.set(ThresholdKind::Price, 300);

        let routes = service.create(&bob, &draft).await.unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].depart_date, "10-06-2030");
        assert_eq!(routes[1].depart_date, "12-06-2030");
        assert!(routes.iter().all(|r| r.currency == "USD" && r.active));
    }

    #[tokio::test]
    async fn test_create_without_threshold_rejected() {
        let (db, alice, _) = setup().await;
        let service = TrackingService::new(db);

        let result = service.create(&alice, &draft()).await;
        assert!(matches!(
            result,
            Err(crate::error::TrackerError::Database(DatabaseError::Validation(_)))
        ));
        assert!(service.active(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_checks_ownership() {
        let (db, alice, bob) = setup().await;
        let service = TrackingService::new(db);
        let mut draft = draft();
        draft.set(ThresholdKind::Percent, 10);
        let routes = service.create(&alice, &draft).await.unwrap();
        let route_id = routes[0].id;

        assert_eq!(service.cancel(bob.id, route_id).await.unwrap(), CancelOutcome::NotFound);
        assert_eq!(service.active(alice.id).await.unwrap().len(), 2);

        assert_eq!(service.cancel(alice.id, route_id).await.unwrap(), CancelOutcome::Cancelled);
        assert_eq!(service.cancel(alice.id, route_id).await.unwrap(), CancelOutcome::NotFound);
        assert_eq!(service.cancel(alice.id, 9999).await.unwrap(), CancelOutcome::NotFound);

        let recent = service.recent(alice.id, 5).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.iter().filter(|r| !r.active).count(), 1);
    }

    fn stored_route(active: bool) -> TrackedRoute {
        TrackedRoute {
            id: 7,
            user_id: 1,
            origin_city: "москва".to_string(),
            destination_city: "сочи".to_string(),
            depart_date: "10-06-2030".to_string(),
            currency: "RUB".to_string(),
            notify_below_price: Some(5000),
            price_drop_percent: Some(10),
            active,
            last_checked_price: None,
            last_notified_price: None,
            last_notified_percent: None,
            created_at: "2030-05-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_render_cards() {
        let tr = Translator::new();
        let route = stored_route(true);
        assert_eq!(
            render_active_route(&route, &tr, Lang::Ru),
            "📌 *Москва → Сочи*\n📅 10-06-2030\n💰 Цена: ≤ 5000 RUB\n📉 Снижение: -10%"
        );
        assert_eq!(
            render_recent_route(&stored_route(false), &tr, Lang::En),
            "📌 *Москва → Сочи*\n📅 10-06-2030\n❌ Cancelled"
        );
        let keyboard = untrack_keyboard(route.id, &tr, Lang::En);
        assert_eq!(keyboard.rows[0][0].callback_data(), Some("untrack_7"));
    }
}
