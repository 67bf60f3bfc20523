use crate::kafka::event::{OrderEventHandler, decode_event};
use anyhow::{Context, Result};
use rdkafka::{
    Message,
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::BorrowedMessage,
};
use shared::domain::{ORDER_CANCELLED_TOPIC, ORDER_PLACED_TOPIC};
use std::sync::Arc;
use tokio::{
    sync::broadcast,
    time::{Duration, sleep},
};
use tracing::{debug, error, info, warn};

pub struct KafkaEventConsumer {
    consumer: StreamConsumer,
    handler: Arc<OrderEventHandler>,
}

impl KafkaEventConsumer {
    pub fn new(brokers: &str, group_id: &str, handler: Arc<OrderEventHandler>) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "6000")
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .context("Failed to create Kafka consumer")?;

        Ok(Self { consumer, handler })
    }

    /// Consumes until shutdown. An event that still fails after the handler's retries ends the
    /// loop with an error and its offset stays uncommitted, so a fresh consumer receives it again.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.consumer
            .subscribe(&[ORDER_PLACED_TOPIC, ORDER_CANCELLED_TOPIC])
            .context("Failed to subscribe to order topics")?;

        info!("✅ Kafka consumer started, subscribed to order events");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("🛑 Kafka consumer received shutdown signal");
                    break;
                }

                message_result = self.consumer.recv() => {
                    match message_result {
                        Err(e) => {
                            error!("Kafka receive error: {e}");
                            sleep(Duration::from_secs(5)).await;
                        }
                        Ok(message) => self.process(&message).await?,
                    }
                }
            }
        }

        info!("✅ Kafka consumer stopped gracefully");
        Ok(())
    }

    async fn process(&self, message: &BorrowedMessage<'_>) -> Result<()> {
        let topic = message.topic();

        let key = message
            .key()
            .and_then(|k| std::str::from_utf8(k).ok())
            .map(|s| s.to_string());

        debug!(
            topic,
            key = ?key,
            partition = message.partition(),
            offset = message.offset(),
            "Received message"
        );

        let event = match decode_event(topic, message.payload()) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    topic,
                    key = ?key,
                    offset = message.offset(),
                    "Skipping undecodable record: {e}"
                );
                return self.commit(message);
            }
        };

        match &key {
            Some(k) if k.parse::<i64>().ok() != Some(event.order_id) => {
                warn!(
                    topic,
                    key = %k,
                    event_order_id = event.order_id,
                    "Key does not match event order_id"
                );
            }
            None => warn!(topic, "Message has no key"),
            _ => {}
        }

        self.handler.handle_event(&event).await.with_context(|| {
            format!(
                "{} event for order {} could not be applied",
                event.event_type, event.order_id
            )
        })?;

        info!(topic, key = ?key, "✅ Event processed successfully");

        self.commit(message)
    }

    fn commit(&self, message: &BorrowedMessage<'_>) -> Result<()> {
        self.consumer
            .commit_message(message, CommitMode::Sync)
            .with_context(|| {
                format!(
                    "Failed to commit offset {} on {}[{}]",
                    message.offset(),
                    message.topic(),
                    message.partition()
                )
            })
    }
}
