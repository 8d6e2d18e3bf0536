use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductChanges};

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every stored product, in natural order
    async fn list(&self) -> ProductResult<Vec<Product>>;

    /// Insert a new product, assigning its id
    async fn create(&self, input: NewProduct) -> ProductResult<Product>;

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Apply `changes` to every record with this id, returning the match count
    async fn update_fields(&self, id: Uuid, changes: ProductChanges) -> ProductResult<u64>;

    /// Remove every record with this id, returning the delete count
    async fn delete(&self, id: Uuid) -> ProductResult<u64>;
}
