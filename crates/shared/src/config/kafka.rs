use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use crate::abstract_trait::KafkaTrait;
use crate::errors::ServiceError;

pub struct Kafka {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl Kafka {
    pub fn new(brokers: &str, delivery_timeout: Duration) -> Result<Self, ServiceError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", delivery_timeout.as_millis().to_string())
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(ServiceError::from)?;

        info!("Kafka producer connected successfully");

        Ok(Kafka {
            producer,
            delivery_timeout,
        })
    }

    pub async fn send_message(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        match self
            .producer
            .send(record, Timeout::After(self.delivery_timeout))
            .await
        {
            Ok(_) => {
                info!(topic, key, "Message acknowledged by broker");
                Ok(())
            }
            Err((kafka_error, _message)) => {
                error!(topic, key, "❌ Failed to deliver message: {kafka_error}");
                Err(ServiceError::from(kafka_error))
            }
        }
    }
}

#[async_trait]
impl KafkaTrait for Kafka {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        self.send_message(topic, key, value).await
    }
}
