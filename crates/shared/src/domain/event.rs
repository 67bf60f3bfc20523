use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const ORDER_PLACED_TOPIC: &str = "order_placed";
pub const ORDER_CANCELLED_TOPIC: &str = "order_cancelled";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    Placed,
    Cancelled,
}

impl OrderEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventType::Placed => "PLACED",
            OrderEventType::Cancelled => "CANCELLED",
        }
    }

    pub fn topic(&self) -> &'static str {
        match self {
            OrderEventType::Placed => ORDER_PLACED_TOPIC,
            OrderEventType::Cancelled => ORDER_CANCELLED_TOPIC,
        }
    }

    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            ORDER_PLACED_TOPIC => Some(OrderEventType::Placed),
            ORDER_CANCELLED_TOPIC => Some(OrderEventType::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLACED" => Ok(OrderEventType::Placed),
            "CANCELLED" => Ok(OrderEventType::Cancelled),
            other => Err(format!("unknown order event type '{other}'")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventItem {
    pub sku_code: String,
    pub quantity: i32,
    pub product_name: String,
    pub price: Decimal,
}

/// Payload published on `order_placed` / `order_cancelled`.
///
/// `order_items` is exactly the persisted item set of the order. `(order_id, event_type)` is
/// the idempotency identity consumers deduplicate on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub order_id: i64,
    pub event_type: OrderEventType,
    pub order_items: Vec<OrderEventItem>,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub emitted_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn partition_key(&self) -> String {
        self.order_id.to_string()
    }

    pub fn topic(&self) -> &'static str {
        self.event_type.topic()
    }
}
