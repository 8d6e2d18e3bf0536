//! Products API routes

use axum::Router;
use domain_products::{handlers, DiskImageStore, MongoProductRepository, ProductService, ResourceLinks};
use std::sync::Arc;

use crate::state::AppState;

/// Create products router
pub fn router(state: &AppState) -> Router {
    let repository = MongoProductRepository::new(&state.db);
    let images = Arc::new(DiskImageStore::new(&state.config.upload_dir));
    let service = ProductService::new(repository, images);

    handlers::router(service, ResourceLinks::new(state.config.products_url()))
}
