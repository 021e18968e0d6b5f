//! Chat transport trait and implementations.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::keyboard::Keyboard;

/// A message ready to be sent or to replace an existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Render `*bold*`, `` `code` `` and `[links](...)`.
    pub markdown: bool,
    pub disable_preview: bool,
}

impl OutgoingMessage {
    /// Plain text without a keyboard.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }

    pub fn without_preview(mut self) -> Self {
        self.disable_preview = true;
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Trait for talking to the chat platform.
///
/// Abstracted to support different transports (Telegram, tests, etc.)
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Send a new message to a chat.
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<()>;

    /// Replace the text (and keyboard) of a message the bot sent earlier.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<()>;

    /// Replace only the keyboard of a message. `None` removes it.
    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    /// Acknowledge a button press, optionally with a short toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// A sender that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl ChatSender for NoOpSender {
    async fn send_message(&self, _chat_id: i64, _message: &OutgoingMessage) -> Result<()> {
        Ok(())
    }

    async fn edit_message(
        &self,
        _chat_id: i64,
        _message_id: i64,
        _message: &OutgoingMessage,
    ) -> Result<()> {
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        _chat_id: i64,
        _message_id: i64,
        _keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// A sender that logs every operation.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl ChatSender for LoggingSender {
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<()> {
        tracing::info!("Sending message to {}: {}", chat_id, message.text);
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<()> {
        tracing::info!("Editing message {} in {}: {}", message_id, chat_id, message.text);
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let buttons = keyboard.map(|k| k.buttons().count()).unwrap_or(0);
        tracing::info!(
            "Editing keyboard of message {} in {} ({} buttons)",
            message_id,
            chat_id,
            buttons
        );
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        tracing::info!("Answering callback {}: {:?}", callback_id, text);
        Ok(())
    }
}

/// One call captured by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Message {
        chat_id: i64,
        message: OutgoingMessage,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        message: OutgoingMessage,
    },
    KeyboardEdit {
        chat_id: i64,
        message_id: i64,
        keyboard: Option<Keyboard>,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
    },
}

impl SentItem {
    /// Text of a sent or edited message.
    pub fn text(&self) -> Option<&str> {
        match self {
            SentItem::Message { message, .. } | SentItem::Edit { message, .. } => {
                Some(&message.text)
            }
            _ => None,
        }
    }

    /// Keyboard attached to a sent or edited message.
    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            SentItem::Message { message, .. } | SentItem::Edit { message, .. } => {
                message.keyboard.as_ref()
            }
            SentItem::KeyboardEdit { keyboard, .. } => keyboard.as_ref(),
            SentItem::CallbackAnswer { .. } => None,
        }
    }
}

/// A sender that keeps every call in memory.
///
/// With `failing` set, new messages are rejected after being recorded,
/// which mimics a user who blocked the bot.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    items: Arc<Mutex<Vec<SentItem>>>,
    failing: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose `send_message` always fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Everything captured so far.
    pub fn items(&self) -> Vec<SentItem> {
        self.lock().clone()
    }

    /// Texts of sent and edited messages, in order.
    pub fn texts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|item| item.text().map(str::to_string))
            .collect()
    }

    /// The most recent item carrying a keyboard.
    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.lock()
            .iter()
            .rev()
            .find_map(|item| item.keyboard().cloned())
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, item: SentItem) {
        self.lock().push(item);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SentItem>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<()> {
        self.push(SentItem::Message {
            chat_id,
            message: message.clone(),
        });
        if self.failing {
            return Err(TrackerError::SendFailed(format!(
                "chat {} is unreachable",
                chat_id
            )));
        }
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<()> {
        self.push(SentItem::Edit {
            chat_id,
            message_id,
            message: message.clone(),
        });
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        self.push(SentItem::KeyboardEdit {
            chat_id,
            message_id,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.push(SentItem::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}
