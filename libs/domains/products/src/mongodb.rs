//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::FindOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{COLLECTION, NewProduct, Product, ProductChanges};
use crate::repository::ProductRepository;

pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    /// Use a custom collection name, mainly for tests sharing one database
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": id.to_string() }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> ProductResult<Vec<Product>> {
        let options = FindOptions::builder()
            .projection(doc! { "_id": 1, "name": 1, "price": 1, "imagePath": 1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        tracing::debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    #[instrument(skip(self, input), fields(product_name = %input.name))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let product = Product::new(input);

        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self, changes))]
    async fn update_fields(&self, id: Uuid, changes: ProductChanges) -> ProductResult<u64> {
        let result = self
            .collection
            .update_many(Self::id_filter(id), changes.to_update_document())
            .await?;

        tracing::info!(
            product_id = %id,
            matched = result.matched_count,
            modified = result.modified_count,
            "Product updated"
        );
        Ok(result.matched_count)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<u64> {
        let result = self.collection.delete_many(Self::id_filter(id)).await?;

        tracing::info!(product_id = %id, deleted = result.deleted_count, "Product deleted");
        Ok(result.deleted_count)
    }
}
