#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use product::{
    abstract_trait::product::{
        repository::{ProductCommandRepositoryTrait, ProductQueryRepositoryTrait},
        service::{DynInventoryAdjuster, DynProductQueryService},
    },
    domain::adjustment::{
        AdjustmentOutcome, AnomalyKind, StockAdjustment, StockLine, UnderflowPolicy,
        plan_deduction,
    },
    kafka::event::{OrderEventHandler, RetryPolicy},
    metrics::InventoryMetrics,
    model::product::Product,
    service::{InventoryAdjuster, InventoryAdjusterDeps, ProductQueryService},
};
use prometheus_client::{encoding::text::encode, registry::Registry};
use rust_decimal::Decimal;
use shared::{
    domain::{OrderEvent, OrderEventItem, OrderEventType},
    errors::RepositoryError,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

pub fn event(order_id: i64, event_type: OrderEventType, items: &[(&str, i32)]) -> OrderEvent {
    let order_items: Vec<OrderEventItem> = items
        .iter()
        .map(|(sku, quantity)| OrderEventItem {
            sku_code: sku.to_string(),
            quantity: *quantity,
            product_name: format!("{sku} product"),
            price: Decimal::new(10_000, 2),
        })
        .collect();

    let total_price = order_items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum();

    OrderEvent {
        order_id,
        event_type,
        order_items,
        total_price,
        order_date: Utc::now(),
        emitted_at: Utc::now(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyRow {
    pub order_id: i64,
    pub event_type: OrderEventType,
    pub sku_code: String,
    pub kind: AnomalyKind,
    pub requested: i32,
    pub applied: i32,
}

#[derive(Default)]
struct InventoryState {
    products: BTreeMap<String, Product>,
    processed: HashSet<(i64, OrderEventType)>,
    adjustments: HashMap<i64, Vec<StockAdjustment>>,
    anomalies: Vec<AnomalyRow>,
}

/// Inventory store double with the same transactional behaviour as the Postgres repository:
/// every call either applies completely or leaves the state untouched.
#[derive(Default)]
pub struct InMemoryInventory {
    state: Mutex<InventoryState>,
    pub fail_writes: AtomicBool,
}

impl InMemoryInventory {
    pub fn with_stock(stock: &[(&str, i32)]) -> Self {
        let inventory = Self::default();
        {
            let mut state = inventory.state.lock().unwrap();
            for (index, (sku, quantity)) in stock.iter().enumerate() {
                state.products.insert(
                    sku.to_string(),
                    Product {
                        id: index as i64 + 1,
                        name: format!("{sku} product"),
                        description: String::new(),
                        sku_code: sku.to_string(),
                        price: Decimal::new(10_000, 2),
                        quantity: *quantity,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    },
                );
            }
        }
        inventory
    }

    pub fn quantity(&self, sku: &str) -> Option<i32> {
        self.state
            .lock()
            .unwrap()
            .products
            .get(sku)
            .map(|p| p.quantity)
    }

    pub fn is_processed(&self, order_id: i64, event_type: OrderEventType) -> bool {
        self.state
            .lock()
            .unwrap()
            .processed
            .contains(&(order_id, event_type))
    }

    pub fn anomalies(&self) -> Vec<AnomalyRow> {
        self.state.lock().unwrap().anomalies.clone()
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Custom("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for InMemoryInventory {
    async fn find_by_sku_codes(&self, sku_codes: &[String]) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(sku_codes
            .iter()
            .filter_map(|sku| state.products.get(sku).cloned())
            .collect())
    }

    async fn find_by_sku(&self, sku_code: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.lock().unwrap().products.get(sku_code).cloned())
    }
}

#[async_trait]
impl ProductCommandRepositoryTrait for InMemoryInventory {
    async fn apply_placed(
        &self,
        order_id: i64,
        lines: &[StockLine],
        policy: UnderflowPolicy,
    ) -> Result<AdjustmentOutcome, RepositoryError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();

        if !state.processed.insert((order_id, OrderEventType::Placed)) {
            return Ok(AdjustmentOutcome::Duplicate);
        }

        if state.processed.contains(&(order_id, OrderEventType::Cancelled)) {
            return Ok(AdjustmentOutcome::Superseded);
        }

        let on_hand: HashMap<String, i32> = lines
            .iter()
            .filter_map(|l| {
                state
                    .products
                    .get(&l.sku_code)
                    .map(|p| (l.sku_code.clone(), p.quantity))
            })
            .collect();

        let adjustments = plan_deduction(lines, &on_hand, policy);

        for adjustment in &adjustments {
            if let Some(product) = state.products.get_mut(&adjustment.sku_code) {
                product.quantity -= adjustment.applied;
                assert!(product.quantity >= 0, "stock went negative");
            }
            if let Some(kind) = adjustment.anomaly {
                state.anomalies.push(AnomalyRow {
                    order_id,
                    event_type: OrderEventType::Placed,
                    sku_code: adjustment.sku_code.clone(),
                    kind,
                    requested: adjustment.requested,
                    applied: adjustment.applied,
                });
            }
        }

        state.adjustments.insert(order_id, adjustments.clone());

        Ok(AdjustmentOutcome::Applied { adjustments })
    }

    async fn apply_cancelled(&self, order_id: i64) -> Result<AdjustmentOutcome, RepositoryError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();

        if !state.processed.insert((order_id, OrderEventType::Cancelled)) {
            return Ok(AdjustmentOutcome::Duplicate);
        }

        let mut deducted: Vec<StockAdjustment> = state
            .adjustments
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|a| a.applied > 0)
            .collect();
        deducted.sort_by(|a, b| a.sku_code.cmp(&b.sku_code));

        let mut restored = Vec::with_capacity(deducted.len());

        for row in deducted {
            match state.products.get_mut(&row.sku_code) {
                Some(product) => {
                    product.quantity += row.applied;
                    restored.push(StockAdjustment {
                        sku_code: row.sku_code,
                        requested: row.applied,
                        applied: row.applied,
                        anomaly: None,
                    });
                }
                None => {
                    state.anomalies.push(AnomalyRow {
                        order_id,
                        event_type: OrderEventType::Cancelled,
                        sku_code: row.sku_code.clone(),
                        kind: AnomalyKind::UnknownSku,
                        requested: row.applied,
                        applied: 0,
                    });
                    restored.push(StockAdjustment {
                        sku_code: row.sku_code,
                        requested: row.applied,
                        applied: 0,
                        anomaly: Some(AnomalyKind::UnknownSku),
                    });
                }
            }
        }

        Ok(AdjustmentOutcome::Applied {
            adjustments: restored,
        })
    }
}

pub struct Harness {
    pub store: Arc<InMemoryInventory>,
    pub adjuster: DynInventoryAdjuster,
    pub handler: OrderEventHandler,
    pub query: DynProductQueryService,
    pub registry: Registry,
}

impl Harness {
    pub fn new(stock: &[(&str, i32)], policy: UnderflowPolicy) -> Self {
        let store = Arc::new(InMemoryInventory::with_stock(stock));
        let mut registry = Registry::default();

        let inventory_metrics = InventoryMetrics::new();
        inventory_metrics.register(&mut registry);

        let adjuster: DynInventoryAdjuster = Arc::new(InventoryAdjuster::new(
            InventoryAdjusterDeps {
                command: store.clone(),
                policy,
                inventory_metrics,
            },
            &mut registry,
        ));

        let handler = OrderEventHandler::new(
            adjuster.clone(),
            RetryPolicy {
                max_retries: 2,
                backoff: Duration::from_millis(1),
            },
        );

        let query: DynProductQueryService =
            Arc::new(ProductQueryService::new(store.clone(), &mut registry));

        Self {
            store,
            adjuster,
            handler,
            query,
            registry,
        }
    }

    pub fn encoded_metrics(&self) -> String {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry).unwrap();
        buffer
    }
}
