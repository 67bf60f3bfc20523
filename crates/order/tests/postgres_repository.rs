//! Runs against a real Postgres: `DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::Utc;
use order::{
    abstract_trait::{
        order::repository::{OrderCommandRepositoryTrait, OrderQueryRepositoryTrait},
        outbox::OutboxRepositoryTrait,
    },
    domain::{
        order::{OrderItem, OrderStatus, total_price},
        requests::order::CreateOrderRecordRequest,
    },
    repository::{
        order::{OrderCommandRepository, OrderQueryRepository},
        outbox::OutboxRepository,
    },
};
use shared::{config::ConnectionPool, domain::OrderEvent};
use std::time::Duration;

fn record() -> CreateOrderRecordRequest {
    let items = vec![
        OrderItem {
            sku_code: "IPHONE_15".into(),
            product_name: "iPhone 15".into(),
            quantity: 2,
            price: "999.99".parse().unwrap(),
        },
        OrderItem {
            sku_code: "AIRPODS".into(),
            product_name: "AirPods".into(),
            quantity: 1,
            price: "129.00".parse().unwrap(),
        },
    ];

    CreateOrderRecordRequest {
        total_price: total_price(&items).unwrap(),
        items,
        order_date: Utc::now(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires postgres"]
async fn order_and_outbox_row_are_written_together(pool: ConnectionPool) {
    let command = OrderCommandRepository::new(pool.clone());
    let query = OrderQueryRepository::new(pool.clone());
    let outbox = OutboxRepository::new(pool);

    let order = command.create_order(&record()).await.unwrap();
    let loaded = query.find_by_id(order.id).await.unwrap().unwrap();

    assert_eq!(loaded, order);
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.items[0].sku_code, "IPHONE_15");

    let claimed = outbox.claim_due(10, Duration::from_secs(30)).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].partition_key, order.id.to_string());
    assert_eq!(claimed[0].attempts, 1);

    let event: OrderEvent = serde_json::from_value(claimed[0].payload.clone()).unwrap();
    assert_eq!(event.order_items.len(), 2);

    assert!(outbox.claim_due(10, Duration::from_secs(30)).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires postgres"]
async fn cancellation_is_conditional_and_waits_behind_placement(pool: ConnectionPool) {
    let command = OrderCommandRepository::new(pool.clone());
    let outbox = OutboxRepository::new(pool);

    let order = command.create_order(&record()).await.unwrap();

    let cancelled = command.cancel_order(order.id, Utc::now()).await.unwrap().unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(command.cancel_order(order.id, Utc::now()).await.unwrap().is_none());

    let first = outbox.claim_due(10, Duration::from_secs(30)).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].event_type, "PLACED");

    outbox.mark_published(first[0].id).await.unwrap();

    let second = outbox.claim_due(10, Duration::from_secs(30)).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].event_type, "CANCELLED");
}
