use crate::domain::{order::Order, requests::order::CreateOrderRecordRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynOrderCommandRepository = Arc<dyn OrderCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait OrderCommandRepositoryTrait {
    /// Stores the order, its items and the PLACED outbox row in one transaction.
    async fn create_order(&self, req: &CreateOrderRecordRequest) -> Result<Order, RepositoryError>;

    /// Moves a PLACED order to CANCELLED and enqueues the CANCELLED outbox row in one
    /// transaction. Returns `None` when the order is not in PLACED state at write time.
    async fn cancel_order(
        &self,
        order_id: i64,
        emitted_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError>;
}
