use async_trait::async_trait;
use opentelemetry::Context;
use shared::{
    domain::{ProductAvailability, ProductAvailabilityRequest},
    errors::ServiceError,
};
use std::sync::Arc;

pub type DynProductClient = Arc<dyn ProductClientTrait + Send + Sync>;

/// Client side of the availability check.
///
/// Returns one entry per requested item, in request order. A SKU the product service does not
/// know yields `ServiceError::NotFound`; a timeout or transport failure yields
/// `ServiceError::Unavailable` and never an "all unavailable" answer.
#[async_trait]
pub trait ProductClientTrait {
    async fn check_availability(
        &self,
        cx: &Context,
        items: &[ProductAvailabilityRequest],
    ) -> Result<Vec<ProductAvailability>, ServiceError>;
}
