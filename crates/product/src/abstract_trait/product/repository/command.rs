use crate::domain::adjustment::{AdjustmentOutcome, StockLine, UnderflowPolicy};
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynProductCommandRepository = Arc<dyn ProductCommandRepositoryTrait + Send + Sync>;

/// Stock mutations driven by order events. Each call is one transaction covering the ledger
/// row, the stock updates and any anomaly rows, so a failure leaves nothing behind and the
/// event can be redelivered.
#[async_trait]
pub trait ProductCommandRepositoryTrait {
    async fn apply_placed(
        &self,
        order_id: i64,
        lines: &[StockLine],
        policy: UnderflowPolicy,
    ) -> Result<AdjustmentOutcome, RepositoryError>;

    /// Restores exactly what the matching placement deducted.
    async fn apply_cancelled(&self, order_id: i64) -> Result<AdjustmentOutcome, RepositoryError>;
}
