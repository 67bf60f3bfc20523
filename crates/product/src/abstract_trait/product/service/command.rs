use crate::domain::adjustment::AdjustmentOutcome;
use async_trait::async_trait;
use shared::{domain::OrderEvent, errors::ServiceError};
use std::sync::Arc;

pub type DynInventoryAdjuster = Arc<dyn InventoryAdjusterTrait + Send + Sync>;

#[async_trait]
pub trait InventoryAdjusterTrait {
    async fn on_placed(&self, event: &OrderEvent) -> Result<AdjustmentOutcome, ServiceError>;
    async fn on_cancelled(&self, event: &OrderEvent) -> Result<AdjustmentOutcome, ServiceError>;
}
