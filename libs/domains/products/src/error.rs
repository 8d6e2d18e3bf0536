use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::images::ImageStoreError;

/// Message returned for every unknown product id
pub const NOT_FOUND_MESSAGE: &str = "No valid entry found for provided ID";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Document store, record validation or image file failure
    #[error("{0}")]
    Store(String),

    #[error("File exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFound(NOT_FOUND_MESSAGE.to_string()),
            ProductError::Store(msg) => AppError::InternalServerError(msg),
            err @ ProductError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ProductError::Multipart(e) => AppError::Multipart(e),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Store(err.to_string())
    }
}

impl From<ImageStoreError> for ProductError {
    fn from(err: ImageStoreError) -> Self {
        ProductError::Store(err.to_string())
    }
}
