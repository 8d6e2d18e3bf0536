//! Products Domain
//!
//! Product catalog backed by MongoDB, with optional image upload on create.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, multipart parsing, link descriptors
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌─────────────┐
//! │   Service   │ ───► │ Image store │  ← upload policy, files on disk
//! └──────┬──────┘      └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers, DiskImageStore, MongoProductRepository, ProductService, ResourceLinks,
//! };
//! use mongodb::Client;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("shop");
//!
//! let repository = MongoProductRepository::new(&db);
//! let service = ProductService::new(repository, Arc::new(DiskImageStore::new("uploads")));
//!
//! let router = handlers::router(service, ResourceLinks::new("http://localhost:8080/api/products"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod images;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{NOT_FOUND_MESSAGE, ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use images::{DiskImageStore, ImageMimeType, ImageStore, ImageStoreError, MAX_IMAGE_BYTES};
pub use models::{
    CreateProductForm, LinkDescriptor, NewProduct, Product, ProductChanges, ProductPatch,
    ProductView, ResourceLinks, UploadOutcome, UploadedImage,
};
pub use crate::mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::{CreatedProduct, ProductService};
