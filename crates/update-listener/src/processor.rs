//! Update processor that connects the Bot API to a [`Conversation`].

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use telegram_client::{BotClient, BotError, ReconnectConfig, Update};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use tracker::{Conversation, TrackerError};

use crate::event::UpdateExt;

/// Default timeout for handling one update (60 seconds).
const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the update processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Whether to react to updates from group chats.
    pub process_groups: bool,

    /// Timeout for handling one update. Fare lookups for many dates are
    /// the slow path.
    pub handler_timeout: Duration,

    /// Backoff for the polling stream.
    pub reconnect: ReconnectConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            process_groups: false,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Errors that can occur while processing updates.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Error from the Bot API.
    #[error("bot API error: {0}")]
    Bot(#[from] BotError),

    /// The conversation failed to handle an update.
    #[error("handler error: {0}")]
    Handler(#[from] TrackerError),

    /// Handling took too long.
    #[error("update handling timed out after {0:?}")]
    Timeout(Duration),

    /// The update stream ended.
    #[error("update stream ended")]
    StreamEnded,
}

/// Result of processing a single update.
#[derive(Debug)]
pub enum ProcessResult {
    /// The update was handed to the conversation.
    Handled { chat_id: i64 },
    /// The update was skipped (group chat, sticker, ...).
    Skipped { reason: String },
    /// Error occurred during processing.
    Error(ProcessorError),
}

/// Receives updates by long polling and feeds them to a [`Conversation`].
///
/// Updates are handled one at a time, in the order the API returns them.
pub struct UpdateProcessor {
    client: BotClient,
    conversation: Arc<Conversation>,
    config: ProcessorConfig,
}

impl UpdateProcessor {
    pub fn new(client: BotClient, conversation: Arc<Conversation>, config: ProcessorConfig) -> Self {
        Self {
            client,
            conversation,
            config,
        }
    }

    /// Create a processor with default configuration.
    pub fn with_defaults(client: BotClient, conversation: Arc<Conversation>) -> Self {
        Self::new(client, conversation, ProcessorConfig::default())
    }

    pub fn client(&self) -> &BotClient {
        &self.client
    }

    /// Check if we should process this update.
    fn should_process(&self, update: &Update) -> Result<(), String> {
        if !self.config.process_groups && !update.is_private() {
            return Err("not a private chat".to_string());
        }
        Ok(())
    }

    /// Process a single update and return the result.
    pub async fn process_update(&self, update: &Update) -> ProcessResult {
        if let Err(reason) = self.should_process(update) {
            debug!("Skipping update {}: {}", update.update_id, reason);
            return ProcessResult::Skipped { reason };
        }

        let Some(event) = update.to_inbound_event() else {
            return ProcessResult::Skipped {
                reason: "nothing to handle".to_string(),
            };
        };
        let chat_id = event.chat_id;

        match timeout(self.config.handler_timeout, self.conversation.handle(event)).await {
            Ok(Ok(())) => ProcessResult::Handled { chat_id },
            Ok(Err(e)) => ProcessResult::Error(ProcessorError::Handler(e)),
            Err(_elapsed) => {
                error!(
                    "Handling update {} for {} timed out after {:?}",
                    update.update_id, chat_id, self.config.handler_timeout
                );
                ProcessResult::Error(ProcessorError::Timeout(self.config.handler_timeout))
            }
        }
    }

    fn log_result(result: ProcessResult) {
        match result {
            ProcessResult::Handled { chat_id } => debug!("Handled update for {}", chat_id),
            ProcessResult::Skipped { reason } => debug!("Skipped: {}", reason),
            // Log but continue processing
            ProcessResult::Error(e) => warn!("Error processing update: {}", e),
        }
    }

    /// Run the processor until the update stream gives up.
    pub async fn run(self) -> Result<(), ProcessorError> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run the processor with graceful shutdown support.
    ///
    /// This method runs until either:
    /// - The provided shutdown signal completes
    /// - The update stream ends after exhausting its retries
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<(), ProcessorError>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!("Starting update processor");

        let mut stream =
            telegram_client::poll_updates_with_reconnect(&self.client, self.config.reconnect.clone());

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping update processor");
                    return Ok(());
                }

                result = stream.next() => {
                    match result {
                        Some(Ok(update)) => {
                            let result = self.process_update(&update).await;
                            Self::log_result(result);
                        }
                        Some(Err(e)) => {
                            error!("Update stream failed: {}", e);
                            return Err(ProcessorError::Bot(e));
                        }
                        None => {
                            warn!("Update stream ended");
                            return Err(ProcessorError::StreamEnded);
                        }
                    }
                }
            }
        }
    }

    /// Run the processor until Ctrl+C is pressed.
    #[cfg(feature = "signal")]
    pub async fn run_until_stopped(self) -> Result<(), ProcessorError> {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_with_shutdown(shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProcessorConfig::default();
        assert!(!config.process_groups);
        assert_eq!(config.handler_timeout, Duration::from_secs(60));
        assert_eq!(config.reconnect.max_retries, None);
    }

    #[test]
    fn test_error_display() {
        let err = ProcessorError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "update handling timed out after 5s");
        assert_eq!(ProcessorError::StreamEnded.to_string(), "update stream ended");
    }
}
