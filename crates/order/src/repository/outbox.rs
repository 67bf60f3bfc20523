use crate::{
    abstract_trait::outbox::OutboxRepositoryTrait,
    model::outbox::{OUTBOX_FAILED, OUTBOX_PENDING, OUTBOX_PUBLISHED, OutboxMessage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{config::ConnectionPool, domain::OrderEvent, errors::RepositoryError};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, error, info};

/// Writes the outbox row for `event` inside the caller's transaction.
pub(crate) async fn enqueue_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &OrderEvent,
) -> Result<(), RepositoryError> {
    let payload = serde_json::to_value(event)?;

    sqlx::query(
        r#"
        INSERT INTO outbox_messages (order_id, event_type, topic, partition_key, payload, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(event.order_id)
    .bind(event.event_type.as_str())
    .bind(event.topic())
    .bind(event.partition_key())
    .bind(payload)
    .bind(OUTBOX_PENDING)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!(
            "❌ Failed to enqueue {} event for order {}: {:?}",
            event.event_type, event.order_id, e
        );
        RepositoryError::from(e)
    })?;

    debug!(
        order_id = event.order_id,
        event_type = %event.event_type,
        "Outbox row enqueued"
    );

    Ok(())
}

#[derive(Clone)]
pub struct OutboxRepository {
    db: ConnectionPool,
}

impl OutboxRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OutboxRepositoryTrait for OutboxRepository {
    async fn claim_due(
        &self,
        limit: i64,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, RepositoryError> {
        // A row waits while an older pending row of the same order exists, which keeps
        // PLACED ahead of CANCELLED for one order.
        let mut rows = sqlx::query_as::<_, OutboxMessage>(
            r#"
            UPDATE outbox_messages
            SET attempts = attempts + 1,
                next_attempt_at = now() + make_interval(secs => $2)
            WHERE id IN (
                SELECT m.id
                FROM outbox_messages m
                WHERE m.status = $3
                  AND m.next_attempt_at <= now()
                  AND NOT EXISTS (
                      SELECT 1
                      FROM outbox_messages prior
                      WHERE prior.order_id = m.order_id
                        AND prior.id < m.id
                        AND prior.status = $3
                  )
                ORDER BY m.id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, order_id, event_type, topic, partition_key, payload, status,
                      attempts, next_attempt_at, last_error, created_at, published_at
            "#,
        )
        .bind(limit)
        .bind(lease.as_secs_f64())
        .bind(OUTBOX_PENDING)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to claim outbox rows: {:?}", e);
            RepositoryError::from(e)
        })?;

        rows.sort_by_key(|row| row.id);

        if !rows.is_empty() {
            debug!("Claimed {} outbox row(s)", rows.len());
        }

        Ok(rows)
    }

    async fn mark_published(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = $2,
                published_at = now(),
                last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(OUTBOX_PUBLISHED)
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to mark outbox row {} as published: {:?}", id, e);
            RepositoryError::from(e)
        })?;

        Ok(())
    }

    async fn reschedule(
        &self,
        id: i64,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET next_attempt_at = $2,
                last_error = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(next_attempt_at)
        .bind(error)
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to reschedule outbox row {}: {:?}", id, e);
            RepositoryError::from(e)
        })?;

        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE outbox_messages
            SET status = $2,
                last_error = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(OUTBOX_FAILED)
        .bind(error)
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to mark outbox row {} as failed: {:?}", id, e);
            RepositoryError::from(e)
        })?;

        info!("Outbox row {} moved to FAILED", id);

        Ok(())
    }
}
