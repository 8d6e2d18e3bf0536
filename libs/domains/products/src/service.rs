//! Product Service - Business logic layer

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::images::{ImageStore, image_file_name, screen_upload};
use crate::models::{
    CreateProductForm, NewProduct, Product, ProductChanges, ProductPatch, UploadOutcome,
    UploadedImage,
};
use crate::repository::ProductRepository;

/// Result of a successful create
#[derive(Debug)]
pub struct CreatedProduct {
    pub product: Product,
    /// `None` when the request carried no image part
    pub image_upload: Option<UploadOutcome>,
}

/// Product service orchestrating the repository and the image store
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    images: Arc<dyn ImageStore>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R, images: Arc<dyn ImageStore>) -> Self {
        Self {
            repository: Arc::new(repository),
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.list().await
    }

    /// Create a product from the multipart form, storing the image if it is acceptable.
    ///
    /// The image is written before the record; if the insert fails the file is
    /// removed again.
    #[instrument(skip(self, form), fields(has_image = form.image.is_some()))]
    pub async fn create_product(&self, form: CreateProductForm) -> ProductResult<CreatedProduct> {
        let (name, price) = required_fields(form.name, form.price)?;

        let (image_path, image_upload) = match form.image {
            Some(image) => {
                let outcome = self.store_image(image).await?;
                let path = match &outcome {
                    UploadOutcome::Accepted { path } => Some(path.clone()),
                    UploadOutcome::Rejected { .. } => None,
                };
                (path, Some(outcome))
            }
            None => (None, None),
        };

        let input = NewProduct {
            name,
            price,
            image_path: image_path.clone(),
        };

        match self.repository.create(input).await {
            Ok(product) => Ok(CreatedProduct {
                product,
                image_upload,
            }),
            Err(err) => {
                if let Some(path) = image_path {
                    if let Err(cleanup) = self.images.remove(&path).await {
                        tracing::warn!(error = %cleanup, "Could not remove image of failed create");
                    }
                }
                Err(err)
            }
        }
    }

    /// An id that is not a UUID can never match and is reported as not found.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        let not_found = || ProductError::NotFound(id.to_string());
        let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;

        self.repository.get_by_id(uuid).await?.ok_or_else(not_found)
    }

    /// Succeeds whether or not a product matched; no patches means no write.
    #[instrument(skip(self, patches), fields(patch_count = patches.len()))]
    pub async fn update_product(&self, id: &str, patches: Vec<ProductPatch>) -> ProductResult<()> {
        let changes = ProductChanges::from_patches(patches);
        if changes.is_empty() {
            tracing::debug!("No changes requested");
            return Ok(());
        }

        let Ok(uuid) = Uuid::parse_str(id) else {
            tracing::debug!("Id is not a UUID, nothing to update");
            return Ok(());
        };

        self.repository.update_fields(uuid, changes).await?;
        Ok(())
    }

    /// Succeeds whether or not a product was removed.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<()> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            tracing::debug!("Id is not a UUID, nothing to delete");
            return Ok(());
        };

        self.repository.delete(uuid).await?;
        Ok(())
    }

    async fn store_image(&self, image: UploadedImage) -> ProductResult<UploadOutcome> {
        match screen_upload(image.content_type.as_deref()) {
            Ok(mime) => {
                let file_name = image_file_name(Utc::now(), &image.file_name);
                let path = self.images.save(&file_name, &image.bytes).await?;
                tracing::debug!(%mime, %path, "Image accepted");
                Ok(UploadOutcome::Accepted { path })
            }
            Err(reason) => {
                tracing::info!(%reason, "Image rejected");
                Ok(UploadOutcome::Rejected { reason })
            }
        }
    }
}

/// Missing or unparsable fields fail like any other store-level write failure.
fn required_fields(name: Option<String>, price: Option<String>) -> ProductResult<(String, f64)> {
    let name = name.ok_or_else(|| {
        ProductError::Store("Product validation failed: name is required".to_string())
    })?;

    let raw_price = price.ok_or_else(|| {
        ProductError::Store("Product validation failed: price is required".to_string())
    })?;

    let price = raw_price
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| {
            ProductError::Store(format!(
                "Product validation failed: price '{}' is not a number",
                raw_price
            ))
        })?;

    Ok((name, price))
}
