use crate::{
    abstract_trait::order::{repository::DynOrderQueryRepository, service::OrderQueryServiceTrait},
    domain::response::order::OrderResponse,
};
use async_trait::async_trait;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Clone)]
pub struct OrderQueryService {
    query: DynOrderQueryRepository,
    metrics: Metrics,
}

impl OrderQueryService {
    pub fn new(query: DynOrderQueryRepository, registry: &mut Registry) -> Self {
        let metrics = Metrics::new();
        metrics.register(registry, "order_query_service", "OrderQueryService");

        Self { query, metrics }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("order-query-service")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Server)
            .with_attributes(attributes)
            .start(&tracer);

        info!("Starting operation: {operation_name}");

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    fn complete_tracing(&self, tracing_ctx: &TracingContext, is_success: bool, message: &str) {
        let status = if is_success {
            StatusUtils::Success
        } else {
            StatusUtils::Error
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", if is_success { "SUCCESS" } else { "ERROR" }),
                KeyValue::new("message", message.to_string()),
            ],
        );

        if is_success {
            info!("✅ {message}");
        } else {
            error!("❌ {message}");
        }

        self.metrics.record(Method::Get, status, elapsed);
        tracing_ctx.cx.span().end();
    }
}

#[async_trait]
impl OrderQueryServiceTrait for OrderQueryService {
    async fn find_by_id(&self, order_id: i64) -> Result<OrderResponse, ServiceError> {
        let tracing_ctx = self.start_tracing(
            "find_order_by_id",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("order.id", order_id),
            ],
        );

        match self.query.find_by_id(order_id).await {
            Ok(Some(order)) => {
                self.complete_tracing(&tracing_ctx, true, &format!("Order {order_id} found"));
                Ok(order.into())
            }
            Ok(None) => {
                self.complete_tracing(&tracing_ctx, false, &format!("Order {order_id} not found"));
                Err(ServiceError::NotFound(format!(
                    "Order with id {order_id} not found"
                )))
            }
            Err(e) => {
                self.complete_tracing(&tracing_ctx, false, &format!("Failed to load order: {e}"));
                Err(ServiceError::Repo(e))
            }
        }
    }
}
