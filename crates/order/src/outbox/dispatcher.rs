use crate::{abstract_trait::outbox::DynOutboxRepository, metrics::OrderMetrics, model::outbox::OutboxMessage};
use chrono::Utc;
use shared::{abstract_trait::DynKafka, errors::ServiceError};
use std::{sync::Arc, time::Duration};
use tokio::sync::{Notify, broadcast, broadcast::error::TryRecvError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub batch_size: i64,
    pub max_attempts: i32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub poll_interval: Duration,
    pub lease: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainResult {
    pub claimed: usize,
    pub published: usize,
    pub rescheduled: usize,
    pub failed: usize,
}

/// Delay before retry number `attempts + 1`: `base * 2^(attempts - 1)`, capped at `max`.
pub fn backoff_delay(attempts: i32, base: Duration, max: Duration) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 30) as u32;
    base.checked_mul(1u32 << exponent)
        .map(|delay| delay.min(max))
        .unwrap_or(max)
}

/// Background publisher for outbox rows.
///
/// Rows are claimed under a lease, published with the order id as the partition key, then marked
/// PUBLISHED. A failed publish is rescheduled with exponential backoff until `max_attempts` is
/// reached, after which the row is parked as FAILED for an operator.
pub struct OutboxDispatcher {
    repository: DynOutboxRepository,
    kafka: DynKafka,
    notify: Arc<Notify>,
    metrics: OrderMetrics,
    config: DispatcherConfig,
}

impl OutboxDispatcher {
    pub fn new(
        repository: DynOutboxRepository,
        kafka: DynKafka,
        notify: Arc<Notify>,
        metrics: OrderMetrics,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            repository,
            kafka,
            notify,
            metrics,
            config,
        }
    }

    pub async fn drain_once(&self) -> Result<DrainResult, ServiceError> {
        let messages = self
            .repository
            .claim_due(self.config.batch_size, self.config.lease)
            .await?;

        let mut result = DrainResult {
            claimed: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            match self.publish(message).await {
                Ok(()) => {
                    result.published += 1;

                    match self.repository.mark_published(message.id).await {
                        Ok(()) => self.metrics.outbox_published(),
                        // The lease expires and the row is sent again; consumers deduplicate.
                        Err(e) => warn!(
                            "⚠️ Outbox row {} published but not marked: {e}",
                            message.id
                        ),
                    }
                }
                Err(e) => {
                    self.metrics.outbox_publish_failed();
                    let reason = e.to_string();

                    if message.attempts >= self.config.max_attempts {
                        error!(
                            outbox_id = message.id,
                            order_id = message.order_id,
                            event_type = %message.event_type,
                            attempts = message.attempts,
                            "🚨 Giving up on outbox event after {} attempts: {reason}",
                            message.attempts
                        );
                        result.failed += 1;

                        if let Err(e) = self.repository.mark_failed(message.id, &reason).await {
                            error!("❌ Failed to park outbox row {}: {e}", message.id);
                        }
                    } else {
                        let delay = backoff_delay(
                            message.attempts,
                            self.config.base_backoff,
                            self.config.max_backoff,
                        );
                        let next_attempt_at = Utc::now()
                            + chrono::Duration::from_std(delay)
                                .unwrap_or_else(|_| chrono::Duration::seconds(60));

                        warn!(
                            outbox_id = message.id,
                            order_id = message.order_id,
                            attempts = message.attempts,
                            "⚠️ Publish failed, retrying in {:?}: {reason}",
                            delay
                        );
                        result.rescheduled += 1;

                        if let Err(e) = self
                            .repository
                            .reschedule(message.id, next_attempt_at, &reason)
                            .await
                        {
                            error!("❌ Failed to reschedule outbox row {}: {e}", message.id);
                        }
                    }
                }
            }
        }

        if result.claimed > 0 {
            debug!(?result, "Outbox drain finished");
        }

        Ok(result)
    }

    async fn publish(&self, message: &OutboxMessage) -> Result<(), ServiceError> {
        let payload = serde_json::to_vec(&message.payload)
            .map_err(|e| ServiceError::Internal(format!("unencodable outbox payload: {e}")))?;

        self.kafka
            .publish(&message.topic, &message.partition_key, &payload)
            .await?;

        info!(
            "📤 Published {} event for order {} to {}",
            message.event_type, message.order_id, message.topic
        );

        Ok(())
    }

    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("🚀 Outbox dispatcher started");

        loop {
            match self.drain_once().await {
                Ok(result) if result.claimed as i64 >= self.config.batch_size => {
                    match shutdown_rx.try_recv() {
                        Err(TryRecvError::Empty) => continue,
                        _ => break,
                    }
                }
                Ok(_) => {}
                Err(e) => error!("❌ Outbox drain failed: {e}"),
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("🛑 Outbox dispatcher stopped");
    }
}
