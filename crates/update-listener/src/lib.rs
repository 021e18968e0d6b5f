//! Telegram transport for the fare bot.
//!
//! This crate connects the Bot API long-polling stream to a
//! [`tracker::Conversation`] and delivers the conversation's replies back
//! through the Bot API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use telegram_client::{BotClient, BotConfig};
//! use tracker::Conversation;
//! use update_listener::{ProcessorConfig, UpdateProcessor};
//!
//! # async fn example(conversation: Arc<Conversation>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = BotClient::connect(BotConfig::new("123456:ABC-DEF")).await?;
//! let processor = UpdateProcessor::new(client, conversation, ProcessorConfig::default());
//!
//! // Handle updates until the stream gives up
//! processor.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod event;
pub mod processor;
pub mod sender;

pub use event::UpdateExt;
pub use processor::{ProcessResult, ProcessorConfig, ProcessorError, UpdateProcessor};
pub use sender::{to_markup, TelegramSender};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
