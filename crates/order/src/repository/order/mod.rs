mod command;
mod query;

pub use self::command::OrderCommandRepository;
pub use self::query::OrderQueryRepository;

use crate::model::order_item::OrderItem as OrderItemModel;
use shared::errors::RepositoryError;
use sqlx::PgExecutor;
use tracing::error;

async fn fetch_items<'e, E>(executor: E, order_id: i64) -> Result<Vec<OrderItemModel>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, OrderItemModel>(
        r#"
        SELECT id, order_id, position, sku_code, product_name, price, quantity
        FROM order_items
        WHERE order_id = $1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await
    .map_err(|e| {
        error!("❌ Failed to fetch items for order {}: {:?}", order_id, e);
        RepositoryError::from(e)
    })
}
