#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opentelemetry::Context;
use order::{
    abstract_trait::{
        http_client::ProductClientTrait,
        order::{
            repository::{OrderCommandRepositoryTrait, OrderQueryRepositoryTrait},
            service::{DynOrderCommandService, DynOrderQueryService},
        },
        outbox::OutboxRepositoryTrait,
    },
    domain::{
        order::{Order, OrderStatus},
        requests::order::{CreateOrderItemRequest, CreateOrderRecordRequest, CreateOrderRequest},
    },
    metrics::OrderMetrics,
    model::outbox::OutboxMessage,
    outbox::{DispatcherConfig, OutboxDispatcher},
    service::order::{OrderCommandService, OrderCommandServiceDeps, OrderQueryService},
};
use prometheus_client::registry::Registry;
use rust_decimal::Decimal;
use shared::{
    abstract_trait::KafkaTrait,
    domain::{OrderEvent, OrderEventType, ProductAvailability, ProductAvailabilityRequest},
    errors::{RepositoryError, ServiceError},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::Notify;

pub fn dec(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

pub fn line(sku: &str, quantity: i32, price: &str) -> CreateOrderItemRequest {
    CreateOrderItemRequest {
        sku_code: sku.into(),
        product_name: format!("{sku} product"),
        quantity,
        price: dec(price),
    }
}

pub fn draft(lines: Vec<CreateOrderItemRequest>) -> CreateOrderRequest {
    CreateOrderRequest { order_items: lines }
}

enum Behaviour {
    Stock(HashMap<String, i32>),
    TimingOut,
}

/// Availability oracle double answering from a fixed stock table.
pub struct FakeProductClient {
    behaviour: Behaviour,
    pub calls: AtomicUsize,
}

impl FakeProductClient {
    pub fn with_stock(stock: &[(&str, i32)]) -> Self {
        Self {
            behaviour: Behaviour::Stock(
                stock
                    .iter()
                    .map(|(sku, qty)| (sku.to_string(), *qty))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            behaviour: Behaviour::TimingOut,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProductClientTrait for FakeProductClient {
    async fn check_availability(
        &self,
        _cx: &Context,
        items: &[ProductAvailabilityRequest],
    ) -> Result<Vec<ProductAvailability>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behaviour {
            Behaviour::TimingOut => Err(ServiceError::Unavailable(
                "operation timed out".into(),
            )),
            Behaviour::Stock(stock) => items
                .iter()
                .map(|item| match stock.get(&item.sku_code) {
                    Some(on_hand) => Ok(ProductAvailability {
                        sku_code: item.sku_code.clone(),
                        available: *on_hand >= item.quantity,
                    }),
                    None => Err(ServiceError::NotFound(format!(
                        "Product not found with SKU code {}",
                        item.sku_code
                    ))),
                })
                .collect(),
        }
    }
}

#[derive(Default)]
struct StoreState {
    next_order_id: i64,
    next_outbox_id: i64,
    orders: BTreeMap<i64, Order>,
    outbox: Vec<OutboxMessage>,
}

/// In-memory order ledger with the same write contract as the Postgres repositories: the order
/// change and its outbox row are applied together or not at all.
#[derive(Default)]
pub struct InMemoryOrderStore {
    state: Mutex<StoreState>,
    pub fail_writes: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.values().cloned().collect()
    }

    pub fn outbox(&self) -> Vec<OutboxMessage> {
        self.state.lock().unwrap().outbox.clone()
    }

    fn enqueue(state: &mut StoreState, event: &OrderEvent) {
        state.next_outbox_id += 1;
        let now = Utc::now();
        state.outbox.push(OutboxMessage {
            id: state.next_outbox_id,
            order_id: event.order_id,
            event_type: event.event_type.as_str().into(),
            topic: event.topic().into(),
            partition_key: event.partition_key(),
            payload: serde_json::to_value(event).unwrap(),
            status: "PENDING".into(),
            attempts: 0,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
            published_at: None,
        });
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for InMemoryOrderStore {
    async fn create_order(&self, req: &CreateOrderRecordRequest) -> Result<Order, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Custom("database unavailable".into()));
        }

        let mut state = self.state.lock().unwrap();
        state.next_order_id += 1;

        let order = Order {
            id: state.next_order_id,
            status: OrderStatus::Placed,
            total_price: req.total_price,
            order_date: req.order_date,
            items: req.items.clone(),
        };

        Self::enqueue(&mut state, &order.to_event(OrderEventType::Placed, Utc::now()));
        state.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        emitted_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Custom("database unavailable".into()));
        }

        let mut state = self.state.lock().unwrap();

        let order = match state.orders.get_mut(&order_id) {
            Some(order) if order.status == OrderStatus::Placed => {
                order.status = OrderStatus::Cancelled;
                order.clone()
            }
            _ => return Ok(None),
        };

        Self::enqueue(&mut state, &order.to_event(OrderEventType::Cancelled, emitted_at));

        Ok(Some(order))
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for InMemoryOrderStore {
    async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().unwrap().orders.get(&order_id).cloned())
    }
}

#[async_trait]
impl OutboxRepositoryTrait for InMemoryOrderStore {
    async fn claim_due(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, RepositoryError> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let mut claimed = Vec::new();

        for row in state.outbox.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            if row.status == "PENDING" && row.next_attempt_at <= now {
                row.attempts += 1;
                row.next_attempt_at = now + chrono::Duration::from_std(lease).unwrap();
                claimed.push(row.clone());
            }
        }

        Ok(claimed)
    }

    async fn mark_published(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state.outbox.iter_mut().find(|r| r.id == id) {
            row.status = "PUBLISHED".into();
            row.published_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn reschedule(
        &self,
        id: i64,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state.outbox.iter_mut().find(|r| r.id == id) {
            row.next_attempt_at = next_attempt_at;
            row.last_error = Some(error.into());
        }
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state.outbox.iter_mut().find(|r| r.id == id) {
            row.status = "FAILED".into();
            row.last_error = Some(error.into());
        }
        Ok(())
    }
}

/// Broker double that records every acknowledged message.
#[derive(Default)]
pub struct RecordingKafka {
    sent: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl RecordingKafka {
    pub fn events(&self) -> Vec<(String, String, OrderEvent)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(topic, key, payload)| {
                (
                    topic.clone(),
                    key.clone(),
                    serde_json::from_slice(payload).unwrap(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl KafkaTrait for RecordingKafka {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.into(), key.into(), value.to_vec()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<InMemoryOrderStore>,
    pub product_client: Arc<FakeProductClient>,
    pub kafka: Arc<RecordingKafka>,
    pub command: DynOrderCommandService,
    pub query: DynOrderQueryService,
    pub dispatcher: OutboxDispatcher,
}

impl Harness {
    pub fn new(product_client: FakeProductClient) -> Self {
        let store = Arc::new(InMemoryOrderStore::default());
        let product_client = Arc::new(product_client);
        let kafka = Arc::new(RecordingKafka::default());
        let notify = Arc::new(Notify::new());
        let order_metrics = OrderMetrics::new();
        let mut registry = Registry::default();

        let command = Arc::new(OrderCommandService::new(
            OrderCommandServiceDeps {
                product_client: product_client.clone(),
                command: store.clone(),
                query: store.clone(),
                outbox_notify: notify.clone(),
                order_metrics: order_metrics.clone(),
            },
            &mut registry,
        ));

        let query = Arc::new(OrderQueryService::new(store.clone(), &mut registry));

        let dispatcher = OutboxDispatcher::new(
            store.clone(),
            kafka.clone(),
            notify,
            order_metrics,
            DispatcherConfig {
                batch_size: 50,
                max_attempts: 3,
                base_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(100),
                poll_interval: Duration::from_millis(10),
                lease: Duration::from_secs(30),
            },
        );

        Self {
            store,
            product_client,
            kafka,
            command,
            query,
            dispatcher,
        }
    }

    /// Publishes everything currently due, one drain per event so per-order ordering holds.
    pub async fn flush_outbox(&self) {
        while self.dispatcher.drain_once().await.unwrap().claimed > 0 {}
    }
}
