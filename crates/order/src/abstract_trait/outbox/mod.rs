use crate::model::outbox::OutboxMessage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::errors::RepositoryError;
use std::{sync::Arc, time::Duration};

pub type DynOutboxRepository = Arc<dyn OutboxRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait OutboxRepositoryTrait {
    /// Leases up to `limit` due PENDING rows, bumping their attempt counter. A leased row is not
    /// handed out again until `lease` elapses, so concurrent dispatchers never share a row.
    async fn claim_due(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, RepositoryError>;

    async fn mark_published(&self, id: i64) -> Result<(), RepositoryError>;

    async fn reschedule(
        &self,
        id: i64,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), RepositoryError>;

    async fn mark_failed(&self, id: i64, error: &str) -> Result<(), RepositoryError>;
}
