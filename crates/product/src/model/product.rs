use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub sku_code: String,
    pub price: Decimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock level of one SKU, read under a row lock.
#[derive(Debug, Clone, FromRow)]
pub struct StockLevel {
    pub sku_code: String,
    pub quantity: i32,
}

/// Applied deduction for one SKU of a placed order.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryAdjustment {
    pub order_id: i64,
    pub sku_code: String,
    pub requested: i32,
    pub applied: i32,
}
