//! Telegram Bot API client library.
//!
//! This crate provides a Rust client for talking to the Telegram Bot API
//! over HTTPS. It supports:
//!
//! - Sending and editing messages with inline keyboards
//! - Answering callback queries from button presses
//! - Receiving updates via long polling, with reconnect backoff
//! - Registering the bot's command menu
//!
//! # Example
//!
//! ```no_run
//! use telegram_client::{BotClient, BotConfig, SendMessageParams};
//!
//! # async fn example() -> Result<(), telegram_client::BotError> {
//! // Connect and verify the token
//! let config = BotConfig::new("123456:ABC-DEF");
//! let client = BotClient::connect(config).await?;
//!
//! // Send a message
//! let sent = client.send_message(SendMessageParams::text(42, "Hello!")).await?;
//! println!("Sent message {}", sent.message_id);
//!
//! // Receive updates
//! use futures::StreamExt;
//! let mut updates = telegram_client::poll_updates(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => println!("Update {}", update.update_id),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::BotClient;
pub use config::BotConfig;
pub use error::BotError;
pub use poll::{poll_updates, poll_updates_with_reconnect, ReconnectConfig, UpdateStream};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
