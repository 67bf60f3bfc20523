use crate::{
    abstract_trait::order::repository::OrderCommandRepositoryTrait,
    domain::{
        order::{Order, OrderStatus},
        requests::order::CreateOrderRecordRequest,
    },
    model::{order::Order as OrderModel, order_item::OrderItem as OrderItemModel},
    repository::{order::fetch_items, outbox::enqueue_event},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{config::ConnectionPool, domain::OrderEventType, errors::RepositoryError};
use tracing::{error, info};

pub struct OrderCommandRepository {
    db: ConnectionPool,
}

impl OrderCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for OrderCommandRepository {
    async fn create_order(&self, req: &CreateOrderRecordRequest) -> Result<Order, RepositoryError> {
        if req.items.is_empty() {
            return Err(RepositoryError::Custom(
                "an order cannot be stored without items".into(),
            ));
        }

        let mut tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        let row = sqlx::query_as::<_, OrderModel>(
            r#"
            INSERT INTO orders (status, total_price, order_date, created_at, updated_at)
            VALUES ($1, $2, $3, current_timestamp, current_timestamp)
            RETURNING id, status, total_price, order_date, created_at, updated_at
            "#,
        )
        .bind(OrderStatus::Placed.as_str())
        .bind(req.total_price)
        .bind(req.order_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to insert order: {:?}", e);
            RepositoryError::from(e)
        })?;

        let mut items = Vec::with_capacity(req.items.len());

        for (position, item) in req.items.iter().enumerate() {
            let item_row = sqlx::query_as::<_, OrderItemModel>(
                r#"
                INSERT INTO order_items (order_id, position, sku_code, product_name, price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, order_id, position, sku_code, product_name, price, quantity
                "#,
            )
            .bind(row.id)
            .bind(position as i32)
            .bind(&item.sku_code)
            .bind(&item.product_name)
            .bind(item.price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                error!(
                    "❌ Failed to insert item {} for order {}: {:?}",
                    item.sku_code, row.id, e
                );
                RepositoryError::from(e)
            })?;

            items.push(item_row);
        }

        let order = row.into_aggregate(items)?;

        enqueue_event(&mut tx, &order.to_event(OrderEventType::Placed, Utc::now())).await?;

        tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit order {}: {:?}", order.id, e);
            RepositoryError::from(e)
        })?;

        info!(
            "✅ Created order {} with {} item(s), total {}",
            order.id,
            order.items.len(),
            order.total_price
        );

        Ok(order)
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        emitted_at: DateTime<Utc>,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        let row = sqlx::query_as::<_, OrderModel>(
            r#"
            UPDATE orders
            SET status = $2,
                updated_at = current_timestamp
            WHERE id = $1 AND status = $3
            RETURNING id, status, total_price, order_date, created_at, updated_at
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled.as_str())
        .bind(OrderStatus::Placed.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to cancel order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        let Some(row) = row else {
            tx.rollback().await.map_err(RepositoryError::from)?;
            info!("ℹ️ Order {} is not in PLACED state, nothing to cancel", order_id);
            return Ok(None);
        };

        let items = fetch_items(&mut *tx, order_id).await?;
        let order = row.into_aggregate(items)?;

        enqueue_event(&mut tx, &order.to_event(OrderEventType::Cancelled, emitted_at)).await?;

        tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit cancellation of order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        info!("🛑 Cancelled order {}", order_id);

        Ok(Some(order))
    }
}
