use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ServiceError;

pub type DynKafka = Arc<dyn KafkaTrait + Send + Sync>;

/// Publishing side of the event bus.
///
/// `key` is the partition key; records sharing a key are delivered in order. `publish`
/// resolves only once the broker acknowledged the record (or the delivery timeout elapsed).
#[async_trait]
pub trait KafkaTrait {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError>;
}
