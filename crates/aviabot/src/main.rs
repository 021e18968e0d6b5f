//! Telegram bot for air-ticket search and price tracking.
//!
//! Wires storage, the fare API, the conversation handler and the price
//! checker together, then handles updates until Ctrl+C.

mod config;

use std::sync::Arc;

use database::Database;
use fare_api::{FareApiConfig, TravelpayoutsClient};
use telegram_client::{BotClient, BotCommand, BotConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracker::{
    bot_commands, seed_reference_data, Catalog, ChatSender, Conversation, FareLookup,
    NotificationDispatcher, PriceChecker, TrackerConfig, Translator,
};
use update_listener::{TelegramSender, UpdateProcessor};

use crate::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let tracker_config = TrackerConfig::from_env()?;
    let fare_config = FareApiConfig::from_env()?;
    info!(?config, "Starting aviabot");

    // Storage and reference data
    if let Some(dir) = config.database_dir() {
        std::fs::create_dir_all(dir)?;
    }
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    seed_reference_data(&db).await?;

    let translator = Arc::new(Translator::load(&db).await?);
    let catalog = Arc::new(Catalog::load(&db).await?);

    // Fare API
    let fares = Arc::new(TravelpayoutsClient::new(fare_config)?);
    let lookup = FareLookup::new(fares.clone(), fares);

    // Bot API
    let client = BotClient::connect(BotConfig::with_api_base(
        &config.telegram_api_url,
        &config.telegram_token,
    ))
    .await?;
    let commands = bot_commands()
        .into_iter()
        .map(|(name, description)| BotCommand::new(name, description))
        .collect();
    if let Err(e) = client.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {}", e);
    }
    let sender: Arc<dyn ChatSender> = Arc::new(TelegramSender::new(client.clone()));

    // Price checks run in the background
    let dispatcher = NotificationDispatcher::new(db.clone(), sender.clone(), translator.clone());
    let checker = Arc::new(PriceChecker::new(
        db.clone(),
        lookup.clone(),
        dispatcher,
        tracker_config.clone(),
    ));
    let checker_task = checker.spawn();

    let conversation = Arc::new(Conversation::new(
        db.clone(),
        sender,
        lookup,
        translator,
        catalog,
        tracker_config,
    ));

    let result = UpdateProcessor::with_defaults(client, conversation)
        .run_until_stopped()
        .await;

    checker_task.abort();
    db.close().await;
    info!("aviabot stopped");

    result?;
    Ok(())
}
