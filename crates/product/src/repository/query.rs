use crate::{
    abstract_trait::product::repository::ProductQueryRepositoryTrait,
    model::product::Product as ProductModel,
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError};
use tracing::{error, info};

#[derive(Clone)]
pub struct ProductQueryRepository {
    db: ConnectionPool,
}

impl ProductQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for ProductQueryRepository {
    async fn find_by_sku_codes(
        &self,
        sku_codes: &[String],
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        info!("🔍 Fetching {} product(s) by SKU", sku_codes.len());

        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT id, name, description, sku_code, price, quantity, created_at, updated_at
            FROM products
            WHERE sku_code = ANY($1)
            "#,
        )
        .bind(sku_codes)
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch products by SKU: {:?}", e);
            RepositoryError::from(e)
        })
    }

    async fn find_by_sku(&self, sku_code: &str) -> Result<Option<ProductModel>, RepositoryError> {
        info!("🆔 Fetching product by SKU: {}", sku_code);

        sqlx::query_as::<_, ProductModel>(
            r#"
            SELECT id, name, description, sku_code, price, quantity, created_at, updated_at
            FROM products
            WHERE sku_code = $1
            "#,
        )
        .bind(sku_code)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch product {}: {:?}", sku_code, e);
            RepositoryError::from(e)
        })
    }
}
