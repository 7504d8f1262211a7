mod common;

use assert_matches::assert_matches;
use common::{arrival, date, event_input, TestApp};
use dock_ledger::{
    entities::{day_ledger::LedgerState, unloading_event},
    errors::ServiceError,
    services::unloading::{LineItemInput, RegisterEventInput},
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn ledger_is_created_once_per_date() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    let day = date(2024, 12, 9);

    let first = ledgers.get_or_create(day).await.unwrap();
    let second = ledgers.get_or_create(day).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.state, LedgerState::Open);
    assert_eq!(first.total_pallets, dec!(0));
    assert!(first.closed_at.is_none());
}

#[tokio::test]
async fn close_freezes_recomputed_total() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 9);
    let company = app.company("Acme").await;
    // 5 x 10 = 50 units per pallet
    let product = app.product("Paper towels", 5, 10).await;

    app.register(day, (8, 0), company, vec![(product, 2, 25)]).await;
    app.register(day, (9, 30), company, vec![(product, 1, 0)]).await;

    let closed = app
        .state
        .services
        .ledgers
        .close(day, "  all trucks in  ")
        .await
        .unwrap();

    assert_eq!(closed.state, LedgerState::Closed);
    assert_eq!(closed.total_pallets, dec!(3.5));
    assert_eq!(closed.notes, "all trucks in");
    assert!(closed.closed_at.is_some());
}

#[tokio::test]
async fn second_close_fails_and_keeps_total() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    let day = date(2024, 12, 10);
    let company = app.company("Acme").await;
    let product = app.product("Rice", 5, 10).await;
    app.register(day, (7, 45), company, vec![(product, 4, 0)]).await;

    let first = ledgers.close(day, "").await.unwrap();
    let second = ledgers.close(day, "again").await;

    assert_matches!(second, Err(ServiceError::AlreadyClosed(d)) if d == day);
    let stored = ledgers.get_by_date(day).await.unwrap();
    assert_eq!(stored.total_pallets, first.total_pallets);
    assert_eq!(stored.notes, "");
    assert_eq!(stored.closed_at, first.closed_at);
}

#[tokio::test]
async fn close_reopen_close_yields_same_total() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    let day = date(2024, 12, 11);
    let company = app.company("Acme").await;
    let product = app.product("Milk", 6, 4).await;
    // 6 x 4 = 24 units; 6 loose = 0.25
    app.register(day, (10, 0), company, vec![(product, 3, 6)]).await;

    let first = ledgers.close(day, "").await.unwrap();
    let reopened = ledgers.reopen(day).await.unwrap();
    assert_eq!(reopened.state, LedgerState::Open);
    assert!(reopened.closed_at.is_none());
    assert_eq!(reopened.total_pallets, first.total_pallets);

    let second = ledgers.close(day, "").await.unwrap();
    assert_eq!(first.total_pallets, dec!(3.25));
    assert_eq!(second.total_pallets, first.total_pallets);
}

#[tokio::test]
async fn deleting_only_event_then_closing_gives_zero() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 12);
    let company = app.company("Acme").await;
    let product = app.product("Oil", 8, 8).await;
    let event = app.register(day, (6, 15), company, vec![(product, 5, 0)]).await;

    app.state.services.unloading.delete(event.id).await.unwrap();
    let closed = app.state.services.ledgers.close(day, "").await.unwrap();

    assert_eq!(closed.total_pallets, dec!(0));
}

#[tokio::test]
async fn closing_an_untouched_date_creates_it_with_zero() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 25);

    let closed = app.state.services.ledgers.close(day, "holiday").await.unwrap();

    assert_eq!(closed.ledger_date, day);
    assert_eq!(closed.state, LedgerState::Closed);
    assert_eq!(closed.total_pallets, dec!(0));
}

#[tokio::test]
async fn register_on_closed_day_fails_and_persists_nothing() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 13);
    let company = app.company("Acme").await;
    let product = app.product("Snacks", 10, 5).await;
    app.state.services.ledgers.close(day, "").await.unwrap();

    let result = app
        .state
        .services
        .unloading
        .register(day, arrival(day, (11, 0)), event_input(Some(company), vec![(product, 1, 0)]))
        .await;

    assert_matches!(result, Err(ServiceError::LedgerClosed(d)) if d == day);
    let stored = unloading_event::Entity::find()
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn closed_day_rejects_malformed_registrations_as_closed() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 13);
    let company = app.company("Acme").await;
    let product = app.product("Snacks", 10, 5).await;
    app.state.services.ledgers.close(day, "").await.unwrap();
    let unloading = &app.state.services.unloading;

    let negative = RegisterEventInput {
        items: vec![LineItemInput {
            product_id: Some(product),
            full_pallets: -1,
            loose_units: 0,
        }],
        ..event_input(Some(company), vec![])
    };
    let bad_type = RegisterEventInput {
        event_type: Some("bogus".to_string()),
        ..event_input(Some(company), vec![(product, 1, 0)])
    };

    for input in [negative, bad_type, event_input(None, vec![])] {
        let result = unloading.register(day, arrival(day, (11, 0)), input).await;
        assert_matches!(result, Err(ServiceError::LedgerClosed(d)) if d == day);
    }
}

#[tokio::test]
async fn racing_closes_produce_one_transition() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    let day = date(2024, 12, 16);
    let company = app.company("Acme").await;
    let product = app.product("Rice", 5, 10).await;
    app.register(day, (8, 0), company, vec![(product, 1, 25)]).await;

    let (a, b) = tokio::join!(ledgers.close(day, "first"), ledgers.close(day, "second"));

    let (winner, loser) = match (a, b) {
        (Ok(closed), Err(err)) | (Err(err), Ok(closed)) => (closed, err),
        other => panic!("expected exactly one successful close, got {:?}", other),
    };
    assert_matches!(loser, ServiceError::AlreadyClosed(d) if d == day);
    assert_eq!(winner.total_pallets, dec!(1.5));
    let stored = ledgers.get_by_date(day).await.unwrap();
    assert_eq!(stored.state, LedgerState::Closed);
    assert_eq!(stored.notes, winner.notes);
    assert_eq!(stored.closed_at, winner.closed_at);
}

#[tokio::test]
async fn frozen_total_matches_live_total_formatting() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    let day = date(2024, 12, 17);
    let company = app.company("Acme").await;
    // 20 of 50 units
    let product = app.product("Paper towels", 5, 10).await;
    app.register(day, (9, 0), company, vec![(product, 0, 20)]).await;

    let live = ledgers.day_summary(day).await.unwrap().total_pallets;
    let closed = ledgers.close(day, "").await.unwrap();
    let stored = ledgers.get_by_date(day).await.unwrap();

    assert_eq!(live.to_string(), "0.40");
    assert_eq!(closed.total_pallets.to_string(), "0.40");
    assert_eq!(stored.total_pallets.to_string(), "0.40");
}

#[tokio::test]
async fn delete_on_closed_day_is_rejected() {
    let app = TestApp::new().await;
    let day = date(2024, 12, 14);
    let company = app.company("Acme").await;
    let product = app.product("Detergent", 12, 6).await;
    let event = app.register(day, (8, 0), company, vec![(product, 2, 0)]).await;
    app.state.services.ledgers.close(day, "").await.unwrap();

    let result = app.state.services.unloading.delete(event.id).await;

    assert_matches!(result, Err(ServiceError::LedgerClosed(_)));
    assert!(app.state.services.unloading.get_event(event.id).await.is_ok());
}

#[tokio::test]
async fn recent_ledgers_are_newest_first_and_skip_excluded_date() {
    let app = TestApp::new().await;
    let ledgers = &app.state.services.ledgers;
    for d in [date(2024, 12, 1), date(2024, 12, 3), date(2024, 12, 2)] {
        ledgers.get_or_create(d).await.unwrap();
    }

    let listed = ledgers
        .list_ledgers(Some(date(2024, 12, 3)), None)
        .await
        .unwrap();
    let dates: Vec<_> = listed.iter().map(|l| l.ledger_date).collect();
    assert_eq!(dates, vec![date(2024, 12, 2), date(2024, 12, 1)]);

    let limited = ledgers.list_ledgers(None, Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].ledger_date, date(2024, 12, 3));
}

#[tokio::test]
async fn get_by_date_never_creates() {
    let app = TestApp::new().await;

    let result = app.state.services.ledgers.get_by_date(date(2030, 1, 1)).await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
    let listed = app.state.services.ledgers.list_ledgers(None, None).await.unwrap();
    assert!(listed.is_empty());
}
