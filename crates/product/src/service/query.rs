use crate::{
    abstract_trait::product::{
        repository::DynProductQueryRepository, service::ProductQueryServiceTrait,
    },
    domain::response::product::ProductResponse,
};
use async_trait::async_trait;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    domain::{ProductAvailability, ProductAvailabilityRequest},
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{error, info};

#[derive(Clone)]
pub struct ProductQueryService {
    query: DynProductQueryRepository,
    metrics: Metrics,
}

impl ProductQueryService {
    pub fn new(query: DynProductQueryRepository, registry: &mut Registry) -> Self {
        let metrics = Metrics::new();
        metrics.register(registry, "product_query_service", "ProductQueryService");

        Self { query, metrics }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("product-query-service")
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

    fn complete_tracing(
        &self,
        tracing_ctx: &TracingContext,
        method: Method,
        is_success: bool,
        message: &str,
    ) {
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

        self.metrics.record(method, status, elapsed);
        tracing_ctx.cx.span().end();
    }
}

/// Answers each request against the snapshot in `on_hand`, keeping request order.
pub(crate) fn answer_availability(
    items: &[ProductAvailabilityRequest],
    on_hand: &HashMap<String, i32>,
) -> Result<Vec<ProductAvailability>, ServiceError> {
    items
        .iter()
        .map(|item| {
            let quantity = on_hand.get(&item.sku_code).ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product not found with SKU code {}",
                    item.sku_code
                ))
            })?;

            Ok(ProductAvailability {
                sku_code: item.sku_code.clone(),
                available: *quantity >= item.quantity,
            })
        })
        .collect()
}

#[async_trait]
impl ProductQueryServiceTrait for ProductQueryService {
    async fn check_availability(
        &self,
        items: &[ProductAvailabilityRequest],
    ) -> Result<Vec<ProductAvailability>, ServiceError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let tracing_ctx = self.start_tracing(
            "check_availability",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("items.count", items.len() as i64),
            ],
        );

        let mut sku_codes: Vec<String> = items.iter().map(|i| i.sku_code.clone()).collect();
        sku_codes.sort();
        sku_codes.dedup();

        let products = match self.query.find_by_sku_codes(&sku_codes).await {
            Ok(products) => products,
            Err(e) => {
                self.complete_tracing(
                    &tracing_ctx,
                    Method::Post,
                    false,
                    &format!("Failed to read stock levels: {e}"),
                );
                return Err(ServiceError::Repo(e));
            }
        };

        let on_hand: HashMap<String, i32> = products
            .into_iter()
            .map(|p| (p.sku_code, p.quantity))
            .collect();

        match answer_availability(items, &on_hand) {
            Ok(answers) => {
                let available = answers.iter().filter(|a| a.available).count();
                self.complete_tracing(
                    &tracing_ctx,
                    Method::Post,
                    true,
                    &format!("{available} of {} item(s) available", answers.len()),
                );
                Ok(answers)
            }
            Err(e) => {
                self.complete_tracing(&tracing_ctx, Method::Post, false, &e.to_string());
                Err(e)
            }
        }
    }

    async fn find_by_sku(&self, sku_code: &str) -> Result<ProductResponse, ServiceError> {
        let tracing_ctx = self.start_tracing(
            "find_product_by_sku",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.sku", sku_code.to_string()),
            ],
        );

        match self.query.find_by_sku(sku_code).await {
            Ok(Some(product)) => {
                self.complete_tracing(
                    &tracing_ctx,
                    Method::Get,
                    true,
                    &format!("Product {sku_code} found"),
                );
                Ok(product.into())
            }
            Ok(None) => {
                self.complete_tracing(
                    &tracing_ctx,
                    Method::Get,
                    false,
                    &format!("Product {sku_code} not found"),
                );
                Err(ServiceError::NotFound(format!(
                    "Product not found with SKU code {sku_code}"
                )))
            }
            Err(e) => {
                self.complete_tracing(
                    &tracing_ctx,
                    Method::Get,
                    false,
                    &format!("Failed to load product {sku_code}: {e}"),
                );
                Err(ServiceError::Repo(e))
            }
        }
    }
}
