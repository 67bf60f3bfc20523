use crate::{
    abstract_trait::product::{
        repository::DynProductCommandRepository, service::InventoryAdjusterTrait,
    },
    domain::adjustment::{AdjustmentOutcome, StockLine, UnderflowPolicy, merge_lines},
    metrics::InventoryMetrics,
};
use async_trait::async_trait;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    domain::{OrderEvent, OrderEventType},
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Applies delivered order events to stock through the idempotency ledger.
#[derive(Clone)]
pub struct InventoryAdjuster {
    command: DynProductCommandRepository,
    policy: UnderflowPolicy,
    inventory_metrics: InventoryMetrics,
    metrics: Metrics,
}

pub struct InventoryAdjusterDeps {
    pub command: DynProductCommandRepository,
    pub policy: UnderflowPolicy,
    pub inventory_metrics: InventoryMetrics,
}

impl InventoryAdjuster {
    pub fn new(deps: InventoryAdjusterDeps, registry: &mut Registry) -> Self {
        let InventoryAdjusterDeps {
            command,
            policy,
            inventory_metrics,
        } = deps;

        let metrics = Metrics::new();
        metrics.register(registry, "inventory_adjuster", "InventoryAdjuster");

        Self {
            command,
            policy,
            inventory_metrics,
            metrics,
        }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("inventory-adjuster")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Consumer)
            .with_attributes(attributes)
            .start(&tracer);

        info!("Starting operation: {operation_name}");

        span.add_event(
            "Operation started",
            vec![KeyValue::new("operation", operation_name.to_string())],
        );

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    fn complete_tracing_success(&self, tracing_ctx: &TracingContext, message: &str) {
        self.complete_tracing_internal(tracing_ctx, true, message);
    }

    fn complete_tracing_error(&self, tracing_ctx: &TracingContext, message: &str) {
        self.complete_tracing_internal(tracing_ctx, false, message);
    }

    fn complete_tracing_internal(&self, tracing_ctx: &TracingContext, is_success: bool, message: &str) {
        let status_str = if is_success { "SUCCESS" } else { "ERROR" };
        let status = if is_success {
            StatusUtils::Success
        } else {
            StatusUtils::Error
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", status_str),
                KeyValue::new("duration_secs", elapsed.to_string()),
                KeyValue::new("message", message.to_string()),
            ],
        );

        if is_success {
            info!("✅ Operation completed successfully: {message}");
        } else {
            error!("❌ Operation failed: {message}");
        }

        self.metrics.record(Method::Consume, status, elapsed);

        tracing_ctx.cx.span().end();
    }

    fn observe(&self, event_type: OrderEventType, order_id: i64, outcome: &AdjustmentOutcome) {
        match outcome {
            AdjustmentOutcome::Duplicate => {
                info!("♻️ Duplicate {} event for order {} discarded", event_type, order_id);
                self.inventory_metrics.event_duplicate(event_type);
            }
            AdjustmentOutcome::Superseded | AdjustmentOutcome::Applied { .. } => {
                self.inventory_metrics.event_applied(event_type);
            }
        }

        for anomaly in outcome.anomalies() {
            let Some(kind) = anomaly.anomaly else {
                continue;
            };
            error!(
                order_id,
                event_type = %event_type,
                sku_code = %anomaly.sku_code,
                requested = anomaly.requested,
                applied = anomaly.applied,
                policy = %self.policy,
                "🚨 Stock anomaly {}: {} of {} unit(s) could not be applied",
                kind,
                anomaly.shortfall(),
                anomaly.requested
            );
            self.inventory_metrics.anomaly(kind);
        }
    }

    async fn apply(
        &self,
        event: &OrderEvent,
        event_type: OrderEventType,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        let operation = match event_type {
            OrderEventType::Placed => "apply_order_placed",
            OrderEventType::Cancelled => "apply_order_cancelled",
        };

        let tracing_ctx = self.start_tracing(
            operation,
            vec![
                KeyValue::new("component", "inventory"),
                KeyValue::new("order.id", event.order_id),
                KeyValue::new("event.type", event_type.as_str()),
            ],
        );

        let result = match event_type {
            OrderEventType::Placed => {
                let lines = stock_lines(event);
                self.command
                    .apply_placed(event.order_id, &lines, self.policy)
                    .await
            }
            OrderEventType::Cancelled => self.command.apply_cancelled(event.order_id).await,
        };

        match result {
            Ok(outcome) => {
                self.observe(event_type, event.order_id, &outcome);
                self.complete_tracing_success(
                    &tracing_ctx,
                    &format!("{} event for order {} handled", event_type, event.order_id),
                );
                Ok(outcome)
            }
            Err(e) => {
                self.complete_tracing_error(
                    &tracing_ctx,
                    &format!(
                        "Failed to apply {} event for order {}: {e}",
                        event_type, event.order_id
                    ),
                );
                Err(ServiceError::Repo(e))
            }
        }
    }
}

fn stock_lines(event: &OrderEvent) -> Vec<StockLine> {
    let (valid, invalid): (Vec<_>, Vec<_>) = event
        .order_items
        .iter()
        .cloned()
        .partition(|item| item.quantity > 0);

    for item in &invalid {
        warn!(
            "⚠️ Ignoring {} with non-positive quantity {} in order {}",
            item.sku_code, item.quantity, event.order_id
        );
    }

    merge_lines(&valid)
}

#[async_trait]
impl InventoryAdjusterTrait for InventoryAdjuster {
    async fn on_placed(&self, event: &OrderEvent) -> Result<AdjustmentOutcome, ServiceError> {
        self.apply(event, OrderEventType::Placed).await
    }

    async fn on_cancelled(&self, event: &OrderEvent) -> Result<AdjustmentOutcome, ServiceError> {
        self.apply(event, OrderEventType::Cancelled).await
    }
}
