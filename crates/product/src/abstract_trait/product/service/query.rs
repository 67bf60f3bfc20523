use crate::domain::response::product::ProductResponse;
use async_trait::async_trait;
use shared::{
    domain::{ProductAvailability, ProductAvailabilityRequest},
    errors::ServiceError,
};
use std::sync::Arc;

pub type DynProductQueryService = Arc<dyn ProductQueryServiceTrait + Send + Sync>;

#[async_trait]
pub trait ProductQueryServiceTrait {
    /// One answer per request item, in request order. Fails with `NotFound` on the first
    /// unknown SKU.
    async fn check_availability(
        &self,
        items: &[ProductAvailabilityRequest],
    ) -> Result<Vec<ProductAvailability>, ServiceError>;

    async fn find_by_sku(&self, sku_code: &str) -> Result<ProductResponse, ServiceError>;
}
