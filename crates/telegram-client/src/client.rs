//! Telegram Bot API HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::types::{
    AnswerCallbackQueryParams, BotCommand, EditMessageReplyMarkupParams, EditMessageTextParams,
    GetUpdatesParams, InlineKeyboardMarkup, Message, SendMessageParams, SetMyCommandsParams,
    Update, User,
};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i32>,
}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct BotClient {
    http: Client,
    config: BotConfig,
    connected: Arc<AtomicBool>,
}

impl BotClient {
    /// Build a client without contacting the API.
    pub fn new(config: BotConfig) -> Result<Self, BotError> {
        if config.token.trim().is_empty() {
            return Err(BotError::Config("bot token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()
            .map_err(BotError::Http)?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build a client and verify the token with `getMe`.
    pub async fn connect(config: BotConfig) -> Result<Self, BotError> {
        let client = Self::new(config)?;

        let me = client.get_me().await?;
        client.connected.store(true, Ordering::SeqCst);
        info!(
            "Connected to Bot API at {} as @{}",
            client.config.api_base,
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        Ok(client)
    }

    /// Check if the last API call succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Get the bot's own user record.
    pub async fn get_me(&self) -> Result<User, BotError> {
        self.api_call::<(), _>("getMe", None).await
    }

    /// Send a message.
    pub async fn send_message(&self, params: SendMessageParams) -> Result<Message, BotError> {
        self.api_call("sendMessage", Some(params)).await
    }

    /// Send a plain text message.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message, BotError> {
        self.send_message(SendMessageParams::text(chat_id, text))
            .await
    }

    /// Replace the text (and optionally the keyboard) of a sent message.
    pub async fn edit_message_text(&self, params: EditMessageTextParams) -> Result<(), BotError> {
        // Answers with the edited message, or `true` for inline messages
        let _: serde_json::Value = self.api_call("editMessageText", Some(params)).await?;
        Ok(())
    }

    /// Replace only the inline keyboard of a sent message.
    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError> {
        let params = EditMessageReplyMarkupParams {
            chat_id,
            message_id,
            reply_markup: keyboard,
        };
        let _: serde_json::Value = self
            .api_call("editMessageReplyMarkup", Some(params))
            .await?;
        Ok(())
    }

    /// Acknowledge a button press, optionally with a toast.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), BotError> {
        let params = AnswerCallbackQueryParams {
            callback_query_id: callback_query_id.to_string(),
            text: text.map(str::to_string),
            show_alert: None,
        };
        let _: bool = self.api_call("answerCallbackQuery", Some(params)).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, BotError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.config.poll_timeout_secs,
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        };
        self.api_call("getUpdates", Some(params)).await
    }

    /// Register the command menu shown by clients.
    pub async fn set_my_commands(&self, commands: Vec<BotCommand>) -> Result<(), BotError> {
        let params = SetMyCommandsParams { commands };
        let _: bool = self.api_call("setMyCommands", Some(params)).await?;
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Call a Bot API method.
    async fn api_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, BotError> {
        let url = self.config.method_url(method);
        debug!("API call: {}", method);

        let request = match &params {
            Some(params) => self.http.post(&url).json(params),
            None => self.http.post(&url),
        };

        let response = request.send().await.map_err(|e| {
            self.connected.store(false, Ordering::SeqCst);
            BotError::Http(e)
        })?;

        // Error responses still carry the JSON envelope, so the status alone
        // is only used when the body is not one.
        let status = response.status();
        let body = response.text().await.map_err(BotError::Http)?;
        let api_response: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(BotError::Json(e)),
            Err(_) => {
                return Err(BotError::Connection(format!("HTTP {}: {}", status, body)));
            }
        };

        self.connected.store(true, Ordering::SeqCst);

        if !api_response.ok {
            return Err(BotError::Api {
                code: api_response.error_code.unwrap_or(status.as_u16() as i32),
                description: api_response
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        api_response.result.ok_or_else(|| BotError::Api {
            code: -1,
            description: "No result in response".to_string(),
        })
    }
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
