use crate::domain::order::{OrderItem, max_amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    #[validate(length(min = 1))]
    pub sku_code: String,

    #[validate(length(min = 1))]
    pub product_name: String,

    #[validate(range(min = 1, max = MAX_LINE_QUANTITY))]
    pub quantity: i32,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,
}

impl From<&CreateOrderItemRequest> for OrderItem {
    fn from(value: &CreateOrderItemRequest) -> Self {
        OrderItem {
            sku_code: value.sku_code.clone(),
            product_name: value.product_name.clone(),
            quantity: value.quantity,
            price: value.price,
        }
    }
}

/// Order draft as submitted by the client. The id, total and status are assigned on placement.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1), nested)]
    pub order_items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderRecordRequest {
    pub items: Vec<OrderItem>,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price").with_message("price must not be negative".into()));
    }
    if *price > max_amount() {
        return Err(ValidationError::new("price")
            .with_message(format!("price must not exceed {}", max_amount()).into()));
    }
    Ok(())
}
