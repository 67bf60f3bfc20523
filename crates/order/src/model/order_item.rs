use crate::domain::order::OrderItem as OrderItemDomain;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub position: i32,
    pub sku_code: String,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<OrderItem> for OrderItemDomain {
    fn from(value: OrderItem) -> Self {
        OrderItemDomain {
            sku_code: value.sku_code,
            product_name: value.product_name,
            quantity: value.quantity,
            price: value.price,
        }
    }
}
