use crate::abstract_trait::http_client::ProductClientTrait;
use async_trait::async_trait;
use opentelemetry::{Context, global};
use reqwest::{Client, StatusCode, header::HeaderMap};
use shared::{
    domain::{ProductAvailability, ProductAvailabilityRequest, ProductAvailabilityResponse},
    errors::{ErrorResponse, ServiceError},
    utils::HeaderInjector,
};
use std::time::Duration;
use tracing::{error, info, warn};

pub struct ProductHttpClient {
    client: Client,
    availability_url: String,
}

impl ProductHttpClient {
    /// `base_url` is the product API root, e.g. `http://product:8051/api/products`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            availability_url: format!("{}/availability", base_url.trim_end_matches('/')),
        })
    }

    fn trace_headers(cx: &Context) -> HeaderMap {
        let mut headers = HeaderMap::new();
        global::get_text_map_propagator(|propagator| {
            propagator.inject_context(cx, &mut HeaderInjector(&mut headers))
        });
        headers
    }
}

#[async_trait]
impl ProductClientTrait for ProductHttpClient {
    async fn check_availability(
        &self,
        cx: &Context,
        items: &[ProductAvailabilityRequest],
    ) -> Result<Vec<ProductAvailability>, ServiceError> {
        info!(
            "📡 Checking availability of {} item(s) at {}",
            items.len(),
            self.availability_url
        );

        let response = self
            .client
            .post(&self.availability_url)
            .headers(Self::trace_headers(cx))
            .json(items)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("⏱️ Availability check timed out: {e}");
                } else {
                    error!("❌ Availability check failed to reach product service: {e}");
                }
                ServiceError::Unavailable(format!("product service: {e}"))
            })?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "unknown SKU".to_string());
            warn!("⚠️ Availability check rejected: {message}");
            return Err(ServiceError::NotFound(message));
        }

        if !status.is_success() {
            error!("❌ Product service answered availability check with {status}");
            return Err(ServiceError::Unavailable(format!(
                "product service returned {status}"
            )));
        }

        let body = response
            .json::<ProductAvailabilityResponse>()
            .await
            .map_err(|e| {
                error!("❌ Undecodable availability response: {e}");
                ServiceError::Unavailable(format!("invalid availability response: {e}"))
            })?;

        Ok(body.product_availability_list)
    }
}
