use crate::model::product::Product;
use async_trait::async_trait;
use shared::errors::RepositoryError;
use std::sync::Arc;

pub type DynProductQueryRepository = Arc<dyn ProductQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait ProductQueryRepositoryTrait {
    /// Unordered; SKUs without a record are simply absent from the result.
    async fn find_by_sku_codes(&self, sku_codes: &[String]) -> Result<Vec<Product>, RepositoryError>;
    async fn find_by_sku(&self, sku_code: &str) -> Result<Option<Product>, RepositoryError>;
}
