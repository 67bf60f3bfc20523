use crate::{
    abstract_trait::{
        http_client::DynProductClient,
        order::{
            repository::{DynOrderCommandRepository, DynOrderQueryRepository},
            service::OrderCommandServiceTrait,
        },
    },
    domain::{
        order::{OrderItem, max_amount, total_price},
        requests::order::{CreateOrderRecordRequest, CreateOrderRequest},
        response::order::OrderResponse,
    },
    metrics::{OrderMetrics, RejectReason},
};
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    domain::{ProductAvailability, ProductAvailabilityRequest},
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use std::sync::Arc;
use tokio::{sync::Notify, time::Instant};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct OrderCommandService {
    product_client: DynProductClient,
    command: DynOrderCommandRepository,
    query: DynOrderQueryRepository,
    outbox_notify: Arc<Notify>,
    order_metrics: OrderMetrics,
    metrics: Metrics,
}

pub struct OrderCommandServiceDeps {
    pub product_client: DynProductClient,
    pub command: DynOrderCommandRepository,
    pub query: DynOrderQueryRepository,
    pub outbox_notify: Arc<Notify>,
    pub order_metrics: OrderMetrics,
}

impl OrderCommandService {
    pub fn new(deps: OrderCommandServiceDeps, registry: &mut Registry) -> Self {
        let OrderCommandServiceDeps {
            product_client,
            command,
            query,
            outbox_notify,
            order_metrics,
        } = deps;

        let metrics = Metrics::new();
        metrics.register(registry, "order_command_service", "OrderCommandService");

        Self {
            product_client,
            command,
            query,
            outbox_notify,
            order_metrics,
            metrics,
        }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("order-command-service")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Server)
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

    fn complete_tracing_success(&self, tracing_ctx: &TracingContext, method: Method, message: &str) {
        self.complete_tracing_internal(tracing_ctx, method, true, message);
    }

    fn complete_tracing_error(&self, tracing_ctx: &TracingContext, method: Method, message: &str) {
        self.complete_tracing_internal(tracing_ctx, method, false, message);
    }

    fn complete_tracing_internal(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        is_success: bool,
        message: &str,
    ) {
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

        self.metrics.record(method, status, elapsed);

        tracing_ctx.cx.span().end();
    }

    /// Asks the product service about every draft line in one call and keeps the available ones.
    async fn available_items(
        &self,
        cx: &Context,
        draft: &[OrderItem],
    ) -> Result<Vec<OrderItem>, ServiceError> {
        let query: Vec<ProductAvailabilityRequest> = draft
            .iter()
            .map(|item| ProductAvailabilityRequest {
                sku_code: item.sku_code.clone(),
                quantity: item.quantity,
            })
            .collect();

        let results = self.product_client.check_availability(cx, &query).await?;

        select_available(draft, &results)
    }
}

/// Keeps the draft lines marked available. `results` must be parallel to `draft`; any other
/// shape is an unusable answer and is reported as `Unavailable`.
pub(crate) fn select_available(
    draft: &[OrderItem],
    results: &[ProductAvailability],
) -> Result<Vec<OrderItem>, ServiceError> {
    if draft.len() != results.len() {
        return Err(ServiceError::Unavailable(format!(
            "availability answer has {} entries for {} items",
            results.len(),
            draft.len()
        )));
    }

    let mut kept = Vec::with_capacity(draft.len());

    for (item, result) in draft.iter().zip(results) {
        if item.sku_code != result.sku_code {
            return Err(ServiceError::Unavailable(format!(
                "availability answer out of order: expected {}, got {}",
                item.sku_code, result.sku_code
            )));
        }
        if result.available {
            kept.push(item.clone());
        } else {
            info!("🚫 Dropping unavailable item {} x{}", item.sku_code, item.quantity);
        }
    }

    Ok(kept)
}

#[async_trait]
impl OrderCommandServiceTrait for OrderCommandService {
    async fn create_order(&self, req: &CreateOrderRequest) -> Result<OrderResponse, ServiceError> {
        info!("🏗️ Creating new order with {} item(s)", req.order_items.len());

        let method = Method::Post;

        let tracing_ctx = self.start_tracing(
            "create_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "create"),
                KeyValue::new("order.items", req.order_items.len() as i64),
            ],
        );

        let draft: Vec<OrderItem> = req.order_items.iter().map(OrderItem::from).collect();

        if draft.is_empty() {
            self.order_metrics.order_rejected(RejectReason::Validation);
            self.complete_tracing_error(&tracing_ctx, method, "Order draft has no items");
            return Err(ServiceError::Validation(vec![
                "orderItems: must contain at least one item".into(),
            ]));
        }

        let available = match self.available_items(&tracing_ctx.cx, &draft).await {
            Ok(items) => items,
            Err(ServiceError::Unavailable(reason)) => {
                warn!("⚠️ Availability unknown ({reason}); treating every item as unavailable");
                Vec::new()
            }
            Err(e) => {
                if matches!(e, ServiceError::NotFound(_)) {
                    self.order_metrics.order_rejected(RejectReason::UnknownSku);
                }
                self.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &format!("Availability check failed: {e}"),
                );
                return Err(e);
            }
        };

        if available.is_empty() {
            self.order_metrics
                .order_rejected(RejectReason::NoAvailableItems);
            self.complete_tracing_error(&tracing_ctx, method, "No items available for the order");
            return Err(ServiceError::NoAvailableItems);
        }

        let Some(total) = total_price(&available) else {
            self.order_metrics.order_rejected(RejectReason::Validation);
            self.complete_tracing_error(&tracing_ctx, method, "Order total out of range");
            return Err(ServiceError::Validation(vec![format!(
                "totalPrice: must not exceed {}",
                max_amount()
            )]));
        };

        let record = CreateOrderRecordRequest {
            total_price: total,
            items: available,
            order_date: Utc::now(),
        };

        let order = match self.command.create_order(&record).await {
            Ok(order) => order,
            Err(e) => {
                self.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &format!("Failed to persist order: {e}"),
                );
                return Err(ServiceError::Repo(e));
            }
        };

        self.outbox_notify.notify_one();

        self.order_metrics.order_placed();
        self.order_metrics
            .observe_creation(tracing_ctx.start_time.elapsed().as_secs_f64());

        self.complete_tracing_success(
            &tracing_ctx,
            method,
            &format!("Order {} placed with {} item(s)", order.id, order.items.len()),
        );

        Ok(order.into())
    }

    async fn cancel_order(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        info!("🛑 Cancelling order {order_id}");

        let method = Method::Put;

        let tracing_ctx = self.start_tracing(
            "cancel_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "cancel"),
                KeyValue::new("order.id", order_id),
            ],
        );

        let existing = match self.query.find_by_id(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                self.complete_tracing_error(&tracing_ctx, method, "Order not found");
                return Err(ServiceError::NotFound(format!(
                    "Order with id {order_id} not found"
                )));
            }
            Err(e) => {
                self.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &format!("Failed to load order: {e}"),
                );
                return Err(ServiceError::Repo(e));
            }
        };

        if existing.is_cancelled() {
            self.complete_tracing_success(
                &tracing_ctx,
                method,
                &format!("Order {order_id} already cancelled, no event emitted"),
            );
            return Ok(existing.into());
        }

        match self.command.cancel_order(order_id, Utc::now()).await {
            Ok(Some(order)) => {
                self.outbox_notify.notify_one();
                self.order_metrics.order_cancelled();
                self.complete_tracing_success(
                    &tracing_ctx,
                    method,
                    &format!("Order {order_id} cancelled"),
                );
                Ok(order.into())
            }
            Ok(None) => {
                // A concurrent cancel won the conditional update; report its result.
                match self.query.find_by_id(order_id).await {
                    Ok(Some(order)) => {
                        self.complete_tracing_success(
                            &tracing_ctx,
                            method,
                            &format!("Order {order_id} was cancelled concurrently"),
                        );
                        Ok(order.into())
                    }
                    Ok(None) => {
                        self.complete_tracing_error(&tracing_ctx, method, "Order not found");
                        Err(ServiceError::NotFound(format!(
                            "Order with id {order_id} not found"
                        )))
                    }
                    Err(e) => {
                        self.complete_tracing_error(
                            &tracing_ctx,
                            method,
                            &format!("Failed to reload order: {e}"),
                        );
                        Err(ServiceError::Repo(e))
                    }
                }
            }
            Err(e) => {
                self.complete_tracing_error(
                    &tracing_ctx,
                    method,
                    &format!("Failed to cancel order: {e}"),
                );
                Err(ServiceError::Repo(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, quantity: i32) -> OrderItem {
        OrderItem {
            sku_code: sku.into(),
            product_name: sku.to_lowercase(),
            quantity,
            price: "10".parse().unwrap(),
        }
    }

    fn answer(sku: &str, available: bool) -> ProductAvailability {
        ProductAvailability {
            sku_code: sku.into(),
            available,
        }
    }

    #[test]
    fn keeps_only_available_lines_in_draft_order() {
        let draft = vec![item("IPHONE_15", 2), item("AIRPODS", 1), item("MACBOOK", 1)];
        let results = vec![
            answer("IPHONE_15", true),
            answer("AIRPODS", false),
            answer("MACBOOK", true),
        ];

        let kept = select_available(&draft, &results).unwrap();

        assert_eq!(kept, vec![item("IPHONE_15", 2), item("MACBOOK", 1)]);
    }

    #[test]
    fn repeated_sku_lines_are_judged_independently() {
        let draft = vec![item("IPHONE_15", 1), item("IPHONE_15", 50)];
        let results = vec![answer("IPHONE_15", true), answer("IPHONE_15", false)];

        let kept = select_available(&draft, &results).unwrap();

        assert_eq!(kept, vec![item("IPHONE_15", 1)]);
    }

    #[test]
    fn mismatched_answer_is_unavailable() {
        let draft = vec![item("IPHONE_15", 2), item("AIRPODS", 1)];

        let short = select_available(&draft, &[answer("IPHONE_15", true)]);
        assert!(matches!(short, Err(ServiceError::Unavailable(_))));

        let swapped = select_available(
            &draft,
            &[answer("AIRPODS", true), answer("IPHONE_15", true)],
        );
        assert!(matches!(swapped, Err(ServiceError::Unavailable(_))));
    }
}
