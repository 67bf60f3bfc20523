use crate::{abstract_trait::product::service::DynInventoryAdjuster, domain::adjustment::AdjustmentOutcome};
use serde_json::Value;
use shared::{
    domain::{OrderEvent, OrderEventType},
    errors::ServiceError,
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("no order event is published on topic '{0}'")]
    UnknownTopic(String),

    #[error("empty payload")]
    EmptyPayload,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes a delivered record. The topic decides the event type; a payload that claims a
/// different one is logged and overridden.
pub fn decode_event(topic: &str, payload: Option<&[u8]>) -> Result<OrderEvent, EventDecodeError> {
    let event_type = OrderEventType::from_topic(topic)
        .ok_or_else(|| EventDecodeError::UnknownTopic(topic.to_string()))?;

    let payload = payload
        .filter(|p| !p.is_empty())
        .ok_or(EventDecodeError::EmptyPayload)?;

    let mut value: Value = serde_json::from_slice(payload)?;

    if let Some(fields) = value.as_object_mut() {
        let claimed = fields
            .get("eventType")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(claimed) = claimed.filter(|c| c != event_type.as_str()) {
            warn!(
                topic,
                claimed = %claimed,
                "Payload event type does not match its topic, using {}",
                event_type
            );
        }

        fields.insert(
            "eventType".to_string(),
            Value::String(event_type.as_str().to_string()),
        );
    }

    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

pub struct OrderEventHandler {
    adjuster: DynInventoryAdjuster,
    retry: RetryPolicy,
}

impl OrderEventHandler {
    pub fn new(adjuster: DynInventoryAdjuster, retry: RetryPolicy) -> Self {
        Self { adjuster, retry }
    }

    /// Applies the event, retrying failures with linear backoff. The last error is returned once
    /// the retries are spent so the caller can leave the offset uncommitted.
    pub async fn handle_event(&self, event: &OrderEvent) -> Result<AdjustmentOutcome, ServiceError> {
        let mut attempt = 0;

        loop {
            let result = match event.event_type {
                OrderEventType::Placed => {
                    info!("📦 Processing PLACED event for order_id={}", event.order_id);
                    self.adjuster.on_placed(event).await
                }
                OrderEventType::Cancelled => {
                    info!("🗑️ Processing CANCELLED event for order_id={}", event.order_id);
                    self.adjuster.on_cancelled(event).await
                }
            };

            match result {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff * attempt;
                    warn!(
                        "🔁 Attempt {}/{} for {} event of order {} failed: {}. Retrying in {:?}",
                        attempt,
                        self.retry.max_retries + 1,
                        event.event_type,
                        event.order_id,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
