//! Conversion of Bot API updates into conversation events.

use telegram_client::Update;
use tracker::{EventKind, InboundEvent};

/// Extension trait for reading an [`Update`] as an [`InboundEvent`].
pub trait UpdateExt {
    /// The event this update carries, or `None` for updates the bot does
    /// not react to (non-text messages, messages from bots, button presses
    /// without data).
    fn to_inbound_event(&self) -> Option<InboundEvent>;

    /// Whether the update comes from a private chat.
    fn is_private(&self) -> bool;
}

impl UpdateExt for Update {
    fn to_inbound_event(&self) -> Option<InboundEvent> {
        if let Some(message) = &self.message {
            if message.from.as_ref().is_some_and(|from| from.is_bot) {
                return None;
            }
            let text = message.text.as_ref()?;
            return Some(InboundEvent {
                chat_id: message.chat.id,
                kind: EventKind::Text(text.clone()),
            });
        }

        let query = self.callback_query.as_ref()?;
        let message = query.message.as_ref()?;
        let data = query.data.as_ref()?;
        Some(InboundEvent {
            chat_id: message.chat.id,
            kind: EventKind::Callback {
                callback_id: query.id.clone(),
                message_id: message.message_id,
                data: data.clone(),
            },
        })
    }

    fn is_private(&self) -> bool {
        let chat = match (&self.message, &self.callback_query) {
            (Some(message), _) => Some(&message.chat),
            (None, Some(query)) => query.message.as_ref().map(|m| &m.chat),
            (None, None) => None,
        };
        chat.is_some_and(|chat| chat.kind == "private")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message() {
        let update = update(json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": 5, "is_bot": false, "first_name": "A"},
                "chat": {"id": 5, "type": "private"},
                "date": 0,
                "text": "москва сочи"
            }
        }));

        assert!(update.is_private());
        assert_eq!(
            update.to_inbound_event(),
            Some(InboundEvent::text(5, "москва сочи"))
        );
    }

    #[test]
    fn test_callback_query() {
        let update = update(json!({
            "update_id": 2,
            "callback_query": {
                "id": "q1",
                "from": {"id": 5, "first_name": "A"},
                "message": {"message_id": 11, "chat": {"id": 5, "type": "private"}},
                "data": "calendar_done"
            }
        }));

        assert_eq!(
            update.to_inbound_event(),
            Some(InboundEvent::callback(5, "q1", 11, "calendar_done"))
        );
    }

    #[test]
    fn test_ignored_updates() {
        let sticker = update(json!({
            "update_id": 3,
            "message": {"message_id": 12, "chat": {"id": 5, "type": "private"}}
        }));
        assert_eq!(sticker.to_inbound_event(), None);

        let from_bot = update(json!({
            "update_id": 4,
            "message": {
                "message_id": 13,
                "from": {"id": 9, "is_bot": true, "first_name": "B"},
                "chat": {"id": 5, "type": "private"},
                "text": "hi"
            }
        }));
        assert_eq!(from_bot.to_inbound_event(), None);

        let no_data = update(json!({
            "update_id": 5,
            "callback_query": {
                "id": "q2",
                "from": {"id": 5, "first_name": "A"},
                "message": {"message_id": 14, "chat": {"id": 5, "type": "private"}}
            }
        }));
        assert_eq!(no_data.to_inbound_event(), None);
    }

    #[test]
    fn test_group_chat_is_not_private() {
        let update = update(json!({
            "update_id": 6,
            "message": {"message_id": 15, "chat": {"id": -100, "type": "group"}, "text": "/start"}
        }));
        assert!(!update.is_private());
    }
}
