use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const OUTBOX_PENDING: &str = "PENDING";
pub const OUTBOX_PUBLISHED: &str = "PUBLISHED";
pub const OUTBOX_FAILED: &str = "FAILED";

/// A pending event intent, written in the same transaction as the order change it describes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutboxMessage {
    pub id: i64,
    pub order_id: i64,
    pub event_type: String,
    pub topic: String,
    pub partition_key: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}
