use crate::{
    abstract_trait::order::repository::OrderQueryRepositoryTrait, domain::order::Order,
    model::order::Order as OrderModel, repository::order::fetch_items,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

#[derive(Clone)]
pub struct OrderQueryRepository {
    db: ConnectionPool,
}

impl OrderQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for OrderQueryRepository {
    async fn find_by_id(&self, order_id: i64) -> Result<Option<Order>, RepositoryError> {
        info!("🔍 Fetching order by id: {}", order_id);

        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let row = sqlx::query_as::<_, OrderModel>(
            r#"
            SELECT id, status, total_price, order_date, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        let Some(row) = row else {
            info!("ℹ️ Order {} not found", order_id);
            return Ok(None);
        };

        let items = fetch_items(&mut *conn, order_id).await?;

        row.into_aggregate(items).map(Some)
    }
}
