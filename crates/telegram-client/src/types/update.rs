//! Incoming update types.

use serde::{Deserialize, Serialize};

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier, used as the polling offset.
    pub update_id: i64,

    /// New incoming message.
    #[serde(default)]
    pub message: Option<Message>,

    /// Inline keyboard button press.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat the update belongs to, if any.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(message) = &self.message {
            return Some(message.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|q| q.message.as_ref())
            .map(|m| m.chat.id)
    }
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier inside the chat.
    pub message_id: i64,

    /// Sender, empty for channel posts.
    #[serde(default)]
    pub from: Option<User>,

    /// Chat the message belongs to.
    pub chat: Chat,

    /// Unix timestamp.
    #[serde(default)]
    pub date: i64,

    /// Text content.
    #[serde(default)]
    pub text: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,

    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub is_bot: bool,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub username: Option<String>,

    /// IETF language tag of the user's client.
    #[serde(default)]
    pub language_code: Option<String>,
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Identifier to pass to `answerCallbackQuery`.
    pub id: String,

    /// Who pressed the button.
    pub from: User,

    /// Message the keyboard is attached to.
    #[serde(default)]
    pub message: Option<Message>,

    /// The button's callback data.
    #[serde(default)]
    pub data: Option<String>,
}
