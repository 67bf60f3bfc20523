use crate::{
    domain::order::{Order as OrderAggregate, OrderStatus},
    model::order_item::OrderItem as OrderItemModel,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::errors::RepositoryError;
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub status: String,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn into_aggregate(
        self,
        items: Vec<OrderItemModel>,
    ) -> Result<OrderAggregate, RepositoryError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::Custom)?;

        Ok(OrderAggregate {
            id: self.id,
            status,
            total_price: self.total_price,
            order_date: self.order_date,
            items: items.into_iter().map(Into::into).collect(),
        })
    }
}
