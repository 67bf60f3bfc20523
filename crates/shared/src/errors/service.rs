use crate::errors::repository::RepositoryError;
use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepositoryError),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("No items available for the order")]
    NoAvailableItems,

    #[error("Insufficient stock for {sku}: requested={requested}, on_hand={on_hand}")]
    InsufficientStock {
        sku: String,
        requested: i32,
        on_hand: i32,
    },

    #[error("Publish failure: {0}")]
    PublishFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<KafkaError> for ServiceError {
    fn from(error: KafkaError) -> Self {
        ServiceError::PublishFailure(error.to_string())
    }
}
