//! Update routing through the processor, without a live Bot API.

use std::sync::Arc;

use fare_api::{FareApiConfig, TravelpayoutsClient};
use serde_json::json;
use telegram_client::{BotClient, BotConfig, Update};
use tracker::{
    seed_reference_data, Catalog, Conversation, FareLookup, RecordingSender, TrackerConfig,
    Translator,
};
use update_listener::{ProcessResult, ProcessorConfig, UpdateProcessor};

async fn build_processor(config: ProcessorConfig) -> (UpdateProcessor, RecordingSender) {
    let db = database::Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    seed_reference_data(&db).await.unwrap();

    let mut fare_config = FareApiConfig::new("test-token");
    fare_config.prices_url = "http://127.0.0.1:1/prices".to_string();
    fare_config.places_url = "http://127.0.0.1:1/places".to_string();
    let fares = Arc::new(TravelpayoutsClient::new(fare_config).unwrap());

    let sender = RecordingSender::new();
    let conversation = Conversation::new(
        db.clone(),
        Arc::new(sender.clone()),
        FareLookup::new(fares.clone(), fares),
        Arc::new(Translator::new()),
        Arc::new(Catalog::builtin()),
        TrackerConfig::default(),
    );

    let client = BotClient::new(BotConfig::with_api_base("http://127.0.0.1:1", "123:abc")).unwrap();
    (
        UpdateProcessor::new(client, Arc::new(conversation), config),
        sender,
    )
}

fn text_update(chat_type: &str, chat_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "from": {"id": chat_id, "first_name": "A"},
            "chat": {"id": chat_id, "type": chat_type},
            "text": text
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_private_text_reaches_conversation() {
    let (processor, sender) = build_processor(ProcessorConfig::default()).await;

    let result = processor.process_update(&text_update("private", 42, "/start")).await;
    assert!(matches!(result, ProcessResult::Handled { chat_id: 42 }));

    let texts = sender.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0], "Выберите язык / Choose your language:");
}

#[tokio::test]
async fn test_group_updates_skipped_by_default() {
    let (processor, sender) = build_processor(ProcessorConfig::default()).await;

    let result = processor.process_update(&text_update("group", -7, "/start")).await;
    assert!(matches!(result, ProcessResult::Skipped { .. }));
    assert!(sender.items().is_empty());

    let config = ProcessorConfig {
        process_groups: true,
        ..ProcessorConfig::default()
    };
    let (processor, sender) = build_processor(config).await;
    let result = processor.process_update(&text_update("group", -7, "/start")).await;
    assert!(matches!(result, ProcessResult::Handled { chat_id: -7 }));
    assert_eq!(sender.texts().len(), 1);
}
