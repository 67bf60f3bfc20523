use crate::domain::order::{Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub sku_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(value: &OrderItem) -> Self {
        OrderItemResponse {
            sku_code: value.sku_code.clone(),
            product_name: value.product_name.clone(),
            quantity: value.quantity,
            price: value.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(value: Order) -> Self {
        OrderResponse {
            order_id: value.id,
            status: value.status,
            total_price: value.total_price,
            order_date: value.order_date,
            order_items: value.items.iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// Body of a successful `POST /create`.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: i64,
    pub status: OrderStatus,
}

impl From<&OrderResponse> for OrderCreatedResponse {
    fn from(value: &OrderResponse) -> Self {
        OrderCreatedResponse {
            order_id: value.order_id,
            status: value.status,
        }
    }
}
