mod common;

use common::{FakeProductClient, Harness, dec, draft, line};
use order::domain::order::OrderStatus;
use shared::{
    domain::{ORDER_CANCELLED_TOPIC, ORDER_PLACED_TOPIC, OrderEventType},
    errors::ServiceError,
};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn only_available_items_are_persisted_and_announced() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 5), ("AIRPODS", 0)]));

    let placed = harness
        .command
        .create_order(&draft(vec![
            line("IPHONE_15", 2, "999.99"),
            line("AIRPODS", 1, "129.00"),
        ]))
        .await
        .unwrap();

    assert_eq!(placed.status, OrderStatus::Placed);
    assert_eq!(placed.order_items.len(), 1);
    assert_eq!(placed.order_items[0].sku_code, "IPHONE_15");
    assert_eq!(placed.order_items[0].quantity, 2);
    assert_eq!(placed.total_price, dec("1999.98"));
    assert_eq!(harness.product_client.calls.load(Ordering::SeqCst), 1);

    harness.flush_outbox().await;

    let events = harness.kafka.events();
    assert_eq!(events.len(), 1);

    let (topic, key, event) = &events[0];
    assert_eq!(topic, ORDER_PLACED_TOPIC);
    assert_eq!(key, &placed.order_id.to_string());
    assert_eq!(event.event_type, OrderEventType::Placed);
    assert_eq!(event.order_id, placed.order_id);
    assert_eq!(event.order_items.len(), 1);
    assert_eq!(event.order_items[0].sku_code, "IPHONE_15");
    assert_eq!(event.order_items[0].quantity, 2);
    assert_eq!(event.total_price, placed.total_price);
}

#[tokio::test]
async fn availability_timeout_rejects_without_side_effects() {
    let harness = Harness::new(FakeProductClient::timing_out());

    let result = harness
        .command
        .create_order(&draft(vec![line("IPHONE_15", 2, "999.99")]))
        .await;

    assert!(matches!(result, Err(ServiceError::NoAvailableItems)));
    assert!(harness.store.orders().is_empty());
    assert!(harness.store.outbox().is_empty());

    harness.flush_outbox().await;
    assert!(harness.kafka.events().is_empty());
}

#[tokio::test]
async fn all_items_out_of_stock_rejects_without_side_effects() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 1), ("AIRPODS", 0)]));

    let result = harness
        .command
        .create_order(&draft(vec![
            line("IPHONE_15", 2, "999.99"),
            line("AIRPODS", 1, "129.00"),
        ]))
        .await;

    assert!(matches!(result, Err(ServiceError::NoAvailableItems)));
    assert!(harness.store.orders().is_empty());
    assert!(harness.store.outbox().is_empty());
}

#[tokio::test]
async fn unknown_sku_is_reported_as_not_found() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 5)]));

    let result = harness
        .command
        .create_order(&draft(vec![
            line("IPHONE_15", 1, "999.99"),
            line("DISCONTINUED", 1, "10.00"),
        ]))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert!(harness.store.orders().is_empty());
}

#[tokio::test]
async fn persistence_failure_is_surfaced_and_nothing_is_published() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 5)]));
    harness.store.fail_writes.store(true, Ordering::SeqCst);

    let result = harness
        .command
        .create_order(&draft(vec![line("IPHONE_15", 1, "999.99")]))
        .await;

    assert!(matches!(result, Err(ServiceError::Repo(_))));

    harness.flush_outbox().await;
    assert!(harness.kafka.events().is_empty());
}

#[tokio::test]
async fn cancelling_twice_emits_a_single_cancellation() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 5), ("AIRPODS", 5)]));

    let placed = harness
        .command
        .create_order(&draft(vec![
            line("IPHONE_15", 2, "999.99"),
            line("AIRPODS", 1, "129.00"),
        ]))
        .await
        .unwrap();

    let first = harness.command.cancel_order(placed.order_id).await.unwrap();
    let second = harness.command.cancel_order(placed.order_id).await.unwrap();

    assert_eq!(first.status, OrderStatus::Cancelled);
    assert_eq!(second, first);

    harness.flush_outbox().await;

    let events = harness.kafka.events();
    let topics: Vec<&str> = events.iter().map(|(topic, _, _)| topic.as_str()).collect();
    assert_eq!(topics, vec![ORDER_PLACED_TOPIC, ORDER_CANCELLED_TOPIC]);

    let (_, key, cancelled) = &events[1];
    assert_eq!(key, &placed.order_id.to_string());
    assert_eq!(cancelled.event_type, OrderEventType::Cancelled);
    assert_eq!(cancelled.order_items, events[0].2.order_items);
}

#[tokio::test]
async fn cancelling_an_unknown_order_is_not_found() {
    let harness = Harness::new(FakeProductClient::with_stock(&[]));

    let result = harness.command.cancel_order(404).await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert!(harness.store.outbox().is_empty());
}

#[tokio::test]
async fn lookup_returns_the_persisted_aggregate() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 5)]));

    let placed = harness
        .command
        .create_order(&draft(vec![line("IPHONE_15", 3, "10.50")]))
        .await
        .unwrap();

    let found = harness.query.find_by_id(placed.order_id).await.unwrap();

    assert_eq!(found, placed);
    assert_eq!(found.total_price, dec("31.50"));
    assert!(matches!(
        harness.query.find_by_id(placed.order_id + 1).await,
        Err(ServiceError::NotFound(_))
    ));
}

// The availability check reserves nothing, so two orders that each fit the current stock are
// both accepted even though together they exceed it. The adjuster resolves the shortfall later.
#[tokio::test]
async fn concurrent_orders_can_overbook_the_same_sku() {
    let harness = Harness::new(FakeProductClient::with_stock(&[("IPHONE_15", 1)]));
    let order = draft(vec![line("IPHONE_15", 1, "999.99")]);

    let (first, second) = tokio::join!(
        harness.command.create_order(&order),
        harness.command.create_order(&order)
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(harness.store.orders().len(), 2);
}
