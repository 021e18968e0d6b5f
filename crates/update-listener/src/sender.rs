//! [`ChatSender`] implementation over the Bot API.

use async_trait::async_trait;
use telegram_client::{
    BotClient, BotError, EditMessageTextParams, InlineKeyboardButton, InlineKeyboardMarkup,
    ParseMode, SendMessageParams,
};
use tracing::debug;
use tracker::{ButtonAction, ChatSender, Keyboard, OutgoingMessage, TrackerError};

/// Delivers conversation replies through a [`BotClient`].
#[derive(Debug, Clone)]
pub struct TelegramSender {
    client: BotClient,
}

impl TelegramSender {
    pub fn new(client: BotClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BotClient {
        &self.client
    }
}

/// Convert a transport-neutral keyboard to Bot API markup.
pub fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.action {
                        ButtonAction::Callback(data) => {
                            InlineKeyboardButton::callback(&button.text, data)
                        }
                        ButtonAction::Url(url) => InlineKeyboardButton::url(&button.text, url),
                    })
                    .collect()
            })
            .collect(),
    )
}

fn parse_mode(message: &OutgoingMessage) -> Option<ParseMode> {
    message.markdown.then_some(ParseMode::Markdown)
}

fn send_failed(e: BotError) -> TrackerError {
    TrackerError::SendFailed(e.to_string())
}

/// Edits that change nothing are rejected by the API; treat them as done.
fn ignore_not_modified(result: Result<(), BotError>) -> tracker::Result<()> {
    match result {
        Err(e) if e.is_not_modified() => {
            debug!("Edit skipped, message not modified");
            Ok(())
        }
        other => other.map_err(send_failed),
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> tracker::Result<()> {
        let mut params = SendMessageParams::text(chat_id, &message.text);
        if let Some(mode) = parse_mode(message) {
            params = params.with_parse_mode(mode);
        }
        if let Some(keyboard) = &message.keyboard {
            params = params.with_keyboard(to_markup(keyboard));
        }
        if message.disable_preview {
            params = params.without_preview();
        }

        let sent = self.client.send_message(params).await.map_err(send_failed)?;
        debug!("Sent message {} to {}", sent.message_id, chat_id);
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> tracker::Result<()> {
        let params = EditMessageTextParams {
            chat_id,
            message_id,
            text: message.text.clone(),
            parse_mode: parse_mode(message),
            reply_markup: message.keyboard.as_ref().map(to_markup),
        };
        ignore_not_modified(self.client.edit_message_text(params).await)
    }

    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Option<&Keyboard>,
    ) -> tracker::Result<()> {
        ignore_not_modified(
            self.client
                .edit_message_reply_markup(chat_id, message_id, keyboard.map(to_markup))
                .await,
        )
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> tracker::Result<()> {
        self.client
            .answer_callback_query(callback_id, text)
            .await
            .map_err(send_failed)
    }
}
