//! Price notifications: audit record first, then delivery.

use std::sync::Arc;

use chrono::NaiveDate;
use database::{notification, Database, TrackedRoute, User};
use tracing::{info, warn};

use crate::callback::CallbackAction;
use crate::error::Result;
use crate::evaluator::Trigger;
use crate::fares::ResolvedRoute;
use crate::format::title_case;
use crate::i18n::{Lang, Translator};
use crate::keyboard::{Button, Keyboard};
use crate::links::booking_link;
use crate::sender::{ChatSender, OutgoingMessage};

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// The audit row exists but the chat platform refused the message.
    DeliveryFailed,
}

/// Sends price notifications.
pub struct NotificationDispatcher {
    db: Database,
    sender: Arc<dyn ChatSender>,
    translator: Arc<Translator>,
}

impl NotificationDispatcher {
    pub fn new(db: Database, sender: Arc<dyn ChatSender>, translator: Arc<Translator>) -> Self {
        Self {
            db,
            sender,
            translator,
        }
    }

    /// Notify a user about a route.
    ///
    /// Errors only when the audit row could not be written, in which case
    /// nothing was sent. A refused delivery is logged and reported as
    /// [`DispatchOutcome::DeliveryFailed`].
    pub async fn dispatch(
        &self,
        user: &User,
        route: &TrackedRoute,
        resolved: &ResolvedRoute,
        depart: NaiveDate,
        price: i64,
        triggers: &[Trigger],
    ) -> Result<DispatchOutcome> {
        let lang = Lang::from_code(&user.language).unwrap_or_default();
        let text = compose(route, price, triggers, &self.translator, lang);

        notification::record(self.db.pool(), user.id, Some(route.id), &text).await?;

        let keyboard = Keyboard::column(vec![
            Button::url(
                self.translator.t("buy_button", lang),
                booking_link(&resolved.origin_code, depart, &resolved.destination_code, 1),
            ),
            Button::callback(
                self.translator.t("stop_tracking", lang),
                CallbackAction::Untrack(route.id).data(),
            ),
        ]);
        let message = OutgoingMessage::text(text).markdown().with_keyboard(keyboard);

        match self.sender.send_message(user.chat_id, &message).await {
            Ok(()) => {
                info!(route_id = route.id, price, "Sent price notification to {}", user.chat_id);
                Ok(DispatchOutcome::Delivered)
            }
            Err(e) => {
                warn!(
                    route_id = route.id,
                    "Failed to deliver notification to {}: {}", user.chat_id, e
                );
                Ok(DispatchOutcome::DeliveryFailed)
            }
        }
    }
}

/// Notification text naming the conditions that fired.
pub fn compose(
    route: &TrackedRoute,
    price: i64,
    triggers: &[Trigger],
    tr: &Translator,
    lang: Lang,
) -> String {
    let conditions: Vec<String> = triggers
        .iter()
        .map(|trigger| match trigger {
            Trigger::Price { limit } => {
                tr.tf("notification_price_condition", lang, &[("price", limit)])
            }
            Trigger::Percent { drop } => {
                tr.tf("notification_percent_condition", lang, &[("percent", drop)])
            }
        })
        .collect();

    let condition = if conditions.is_empty() {
        String::new()
    } else {
        format!(
            " ({})",
            conditions.join(&tr.t("notification_condition_joiner", lang))
        )
    };

    tr.tf(
        "notification_text",
        lang,
        &[
            ("origin", &title_case(&route.origin_city)),
            ("destination", &title_case(&route.destination_city)),
            ("date", &route.depart_date),
            ("price", &price),
            ("currency", &route.currency),
            ("condition", &condition),
        ],
    )
}
