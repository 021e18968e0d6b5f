//! End-to-end chat flows against an in-memory database and scripted fares.

mod common;

use common::{days_ahead, Harness};
use database::{feedback, search_history, tracked_route};
use tracker::format::{api_date, track_date};
use tracker::{Lang, Mode, SentItem};

const ALICE: i64 = 1001;
const BOB: i64 = 2002;

#[tokio::test]
async fn test_calendar_search_replies_once_for_all_dates() {
    let h = Harness::new(4200).await;
    let alice = h.register(ALICE, "en").await;

    h.text(ALICE, "Moscow Sochi").await;
    assert_eq!(h.last_text(), "Select dates:");
    assert!(h.sender.last_keyboard().is_some());

    let first = days_ahead(30);
    let second = days_ahead(31);
    h.press(ALICE, 50, &format!("cal:{}", track_date(first))).await;
    h.press(ALICE, 50, &format!("cal:{}", track_date(second))).await;
    h.sender.clear();

    h.press(ALICE, 50, "calendar_done").await;

    let requests = h.fares.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].departure, api_date(first));
    assert_eq!(requests[1].departure, api_date(second));
    assert!(requests.iter().all(|r| r.currency == "USD" && !r.direct));

    let messages: Vec<_> = h
        .sender
        .items()
        .into_iter()
        .filter_map(|item| match item {
            SentItem::Message { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(messages.len(), 1);
    let reply = &messages[0];
    assert!(reply.markdown);
    assert!(reply.disable_preview);
    assert!(reply.text.contains(&track_date(first)));
    assert!(reply.text.contains(&track_date(second)));
    assert!(reply.text.contains("4200 USD"));
    assert!(!reply.text.contains("approximate"));

    let history = search_history::list_recent(h.db.pool(), alice.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);

    let session = h.conversation.sessions().get(ALICE).await;
    assert_eq!(session.mode, Mode::Idle);
}

#[tokio::test]
async fn test_dated_search_multiplies_for_passengers() {
    let h = Harness::new(3000).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, "/filters").await;
    h.press(ALICE, 60, "passenger_plus").await;
    h.press(ALICE, 60, "filters_done").await;
    h.sender.clear();

    let date = days_ahead(20);
    h.text(ALICE, &format!("moscow sochi {}", track_date(date))).await;

    let reply = h.last_text();
    assert!(reply.contains("6000 USD"));
    assert!(reply.contains("MOW") || reply.contains("aviasales"));
    assert!(reply.ends_with(&h.translator.t("multi_passenger_warning", Lang::En)));
}

#[tokio::test]
async fn test_search_without_results() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;
    h.fares.set_price(None);

    h.text(ALICE, &format!("moscow sochi {}", track_date(days_ahead(10)))).await;
    assert_eq!(h.last_text(), h.translator.t("not_found", Lang::En));
}

#[tokio::test]
async fn test_unknown_city_and_bad_input() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, &format!("moscow atlantis {}", track_date(days_ahead(10)))).await;
    assert_eq!(h.last_text(), h.translator.t("city_error", Lang::En));

    h.text(ALICE, "moscow sochi tomorrow").await;
    assert_eq!(h.last_text(), h.translator.t("date_error", Lang::En));

    h.text(ALICE, "moscow").await;
    assert_eq!(h.last_text(), h.translator.t("invalid_format", Lang::En));

    assert!(h.fares.requests().is_empty());
}

#[tokio::test]
async fn test_calendar_done_strips_past_dates_and_stays_open() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, "moscow sochi").await;
    h.press(ALICE, 70, "calendar_done").await;
    assert!(h.last_text().starts_with(&h.translator.t("calendar_no_dates", Lang::En)));

    h.press(ALICE, 70, "cal:01-01-2020").await;
    h.press(ALICE, 70, "calendar_done").await;
    assert!(h.last_text().starts_with(&format!(
        "{}: 01-01-2020",
        h.translator.t("past_date", Lang::En)
    )));

    let session = h.conversation.sessions().get(ALICE).await;
    match session.mode {
        Mode::Calendar(flow) => assert!(flow.selector.selected().is_empty()),
        other => panic!("calendar closed: {:?}", other),
    }
    assert!(h.fares.requests().is_empty());
}

#[tokio::test]
async fn test_stale_calendar_button() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.press(ALICE, 80, "calendar_done").await;
    assert_eq!(h.last_text(), h.translator.t("calendar_no_route", Lang::En));
}

#[tokio::test]
async fn test_track_setup_rejects_bad_thresholds_then_saves() {
    let h = Harness::new(1).await;
    let alice = h.register(ALICE, "en").await;
    let date = days_ahead(40);

    h.text(ALICE, "/track").await;
    h.text(ALICE, &format!("moscow sochi {}", track_date(date))).await;
    assert_eq!(h.last_text(), h.translator.t("tracking_parameters_prompt", Lang::En));

    h.press(ALICE, 90, "track_confirm").await;
    assert_eq!(h.last_text(), h.translator.t("track_confirm_missing", Lang::En));

    h.press(ALICE, 90, "track_price").await;
    for bad in ["abc", "-5", "0"] {
        h.text(ALICE, bad).await;
        assert_eq!(h.last_text(), h.translator.t("positive_number_only", Lang::En));
    }
    h.text(ALICE, "5000").await;
    assert!(h.last_text().contains("5000"));

    h.press(ALICE, 91, "track_confirm").await;
    assert_eq!(h.last_text(), "✅ Tracking saved for 1 date(s).");

    let routes = tracked_route::list_active_for_user(h.db.pool(), alice.id).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].origin_city, "moscow");
    assert_eq!(routes[0].depart_date, track_date(date));
    assert_eq!(routes[0].currency, "USD");
    assert_eq!(routes[0].notify_below_price, Some(5000));
    assert_eq!(routes[0].price_drop_percent, None);
    assert_eq!(h.conversation.sessions().get(ALICE).await.mode, Mode::Idle);
}

#[tokio::test]
async fn test_untrack_respects_ownership() {
    let h = Harness::new(1).await;
    let alice = h.register(ALICE, "en").await;
    h.register(BOB, "ru").await;

    h.text(ALICE, "/track").await;
    h.text(ALICE, &format!("moscow sochi {}", track_date(days_ahead(15)))).await;
    h.press(ALICE, 10, "track_percent").await;
    h.text(ALICE, "15").await;
    h.press(ALICE, 11, "track_confirm").await;
    let route = tracked_route::list_active_for_user(h.db.pool(), alice.id)
        .await
        .unwrap()
        .remove(0);
    assert_eq!(route.price_drop_percent, Some(15));

    let untrack = format!("untrack_{}", route.id);
    h.press(BOB, 12, &untrack).await;
    assert_eq!(h.last_text(), h.translator.t("untrack_not_found", Lang::Ru));
    assert!(tracked_route::get_route(h.db.pool(), route.id).await.unwrap().active);

    h.press(ALICE, 13, &untrack).await;
    assert_eq!(h.last_text(), h.translator.t("untrack_cancelled", Lang::En));
    assert!(!tracked_route::get_route(h.db.pool(), route.id).await.unwrap().active);

    h.press(ALICE, 13, &untrack).await;
    assert_eq!(h.last_text(), h.translator.t("untrack_not_found", Lang::En));
}

#[tokio::test]
async fn test_mytracks_lists_each_route_with_cancel_button() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, "/mytracks").await;
    assert_eq!(h.last_text(), h.translator.t("no_active_tracks", Lang::En));

    h.text(ALICE, "/track").await;
    h.text(ALICE, "moscow sochi").await;
    h.press(ALICE, 20, &format!("cal:{}", track_date(days_ahead(5)))).await;
    h.press(ALICE, 20, &format!("cal:{}", track_date(days_ahead(6)))).await;
    h.press(ALICE, 20, "calendar_done").await;
    assert_eq!(h.last_text(), h.translator.t("track_prompt_dates", Lang::En));
    h.press(ALICE, 20, "track_price").await;
    h.text(ALICE, "7000").await;
    h.press(ALICE, 21, "track_confirm").await;
    assert_eq!(h.last_text(), "✅ Tracking saved for 2 date(s).");

    h.sender.clear();
    h.text(ALICE, "/mytracks").await;
    let items = h.sender.items();
    assert_eq!(items.len(), 2);
    for item in &items {
        let keyboard = item.keyboard().unwrap();
        assert!(keyboard.rows[0][0]
            .callback_data()
            .unwrap()
            .starts_with("untrack_"));
    }
}

#[tokio::test]
async fn test_feedback_is_stored() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, "/feedback").await;
    h.text(ALICE, "Great bot").await;
    assert_eq!(h.last_text(), h.translator.t("feedback_thanks", Lang::En));

    let stored = feedback::list_all(h.db.pool()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].message, "Great bot");
}

#[tokio::test]
async fn test_history_requires_registration() {
    let h = Harness::new(1).await;

    h.text(ALICE, "/history").await;
    assert_eq!(h.last_text(), h.translator.t("history_user_not_found", Lang::Ru));
}

#[tokio::test]
async fn test_unknown_command_gets_help() {
    let h = Harness::new(1).await;
    h.register(ALICE, "en").await;

    h.text(ALICE, "/whatever").await;
    assert_eq!(h.last_text(), h.translator.t("help_text", Lang::En));
}

#[tokio::test]
async fn test_currency_selection_persists() {
    let h = Harness::new(1).await;
    let alice = h.register(ALICE, "ru").await;
    assert_eq!(alice.currency, "RUB");

    h.press(ALICE, 30, "currency:eur").await;
    let session = h.conversation.sessions().get(ALICE).await;
    assert_eq!(session.currency, "EUR");
    assert!(matches!(session.mode, Mode::Filters(_)));

    let stored = database::user::get_by_chat_id(h.db.pool(), ALICE).await.unwrap();
    assert_eq!(stored.currency, "EUR");

    h.press(ALICE, 30, "currency:XYZ").await;
    assert_eq!(h.last_text(), h.translator.t("unknown_currency", Lang::Ru));
}

#[tokio::test]
async fn test_percent_threshold_above_hundred_is_rejected() {
    let h = Harness::new(1).await;
    let alice = h.register(ALICE, "en").await;

    h.text(ALICE, "/track").await;
    h.text(ALICE, &format!("moscow sochi {}", track_date(days_ahead(25)))).await;
    h.press(ALICE, 40, "track_percent").await;

    for out_of_range in ["101", "100000000000000000"] {
        h.text(ALICE, out_of_range).await;
        assert_eq!(h.last_text(), h.translator.t("percent_out_of_range", Lang::En));
    }
    assert!(matches!(
        h.conversation.sessions().get(ALICE).await.mode,
        Mode::AwaitingThreshold { .. }
    ));

    h.text(ALICE, "100").await;
    h.press(ALICE, 41, "track_confirm").await;
    let routes = tracked_route::list_active_for_user(h.db.pool(), alice.id).await.unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].price_drop_percent, Some(100));
}
