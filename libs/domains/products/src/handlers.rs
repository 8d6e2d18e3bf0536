//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AppError,
    errors::responses::{
        InternalServerErrorResponse, NotFoundResponse, PayloadTooLargeResponse,
        UnprocessableEntityResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{ProductError, ProductResult};
use crate::images::{FORM_OVERHEAD_BYTES, MAX_IMAGE_BYTES};
use crate::models::{
    CreateProductForm, CreateProductMultipart, CreateProductResponse, CreatedProductView,
    LinkDescriptor, MessageResponse, ProductDetailResponse, ProductListEntry, ProductListResponse,
    ProductPatch, ProductView, ResourceLinks, UploadOutcome, UploadedImage,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// Multipart field carrying the image file
pub const IMAGE_FIELD: &str = "productImage";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            ProductView, ProductListEntry, ProductListResponse, CreateProductMultipart,
            CreateProductResponse, CreatedProductView, ProductDetailResponse,
            MessageResponse, LinkDescriptor, ProductPatch, UploadOutcome
        ),
        responses(
            NotFoundResponse,
            PayloadTooLargeResponse,
            UnprocessableEntityResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

struct ProductsState<R: ProductRepository> {
    service: ProductService<R>,
    links: ResourceLinks,
}

type SharedState<R> = State<Arc<ProductsState<R>>>;

/// Create the products router; `links` renders the `request` descriptors.
pub fn router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    links: ResourceLinks,
) -> Router {
    let state = Arc::new(ProductsState { service, links });

    Router::new()
        .route(
            "/",
            get(list_products::<R>)
                .post(create_product::<R>)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route(
            "/{id}",
            get(get_product::<R>)
                .patch(update_product::<R>)
                .delete(delete_product::<R>),
        )
        .with_state(state)
}

/// List all products
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "Every product with a link to itself", body = ProductListResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(state): SharedState<R>,
) -> Result<Json<ProductListResponse>, AppError> {
    let products = state.service.list_products().await?;

    let products: Vec<ProductListEntry> = products
        .into_iter()
        .map(|product| ProductListEntry {
            request: state.links.product(&product.id.to_string()),
            id: product.id,
            name: product.name,
            price: product.price,
            image_path: product.image_path,
        })
        .collect();

    Ok(Json(ProductListResponse {
        count: products.len(),
        products,
    }))
}

/// Create a product, optionally with an image
///
/// Files other than `image/jpeg` and `image/png` are not stored; the
/// product is still created and `imageUpload` reports the rejection.
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body(content = CreateProductMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = CreateProductResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(state): SharedState<R>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = read_create_form(multipart?).await?;
    let created = state.service.create_product(form).await?;

    let product = created.product;
    let response = CreateProductResponse {
        message: "Created product successfully".to_string(),
        created_product: CreatedProductView {
            request: state.links.product(&product.id.to_string()),
            id: product.id,
            name: product.name,
            price: product.price,
        },
        image_upload: created.image_upload,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductDetailResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(state): SharedState<R>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let product = state.service.get_product(&id).await?;

    Ok(Json(ProductDetailResponse {
        product: product.view(),
        request: state.links.collection(),
    }))
}

/// Change selected fields of a product
///
/// Applied to every record with the id; succeeds even when nothing matched.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    request_body = Vec<ProductPatch>,
    responses(
        (status = 200, description = "Update applied", body = MessageResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(state): SharedState<R>,
    Path(id): Path<String>,
    payload: Result<Json<Vec<ProductPatch>>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(patches) = payload?;
    state.service.update_product(&id, patches).await?;

    Ok(Json(MessageResponse {
        message: "Product Updated".to_string(),
        request: state.links.product(&id),
    }))
}

/// Delete a product
///
/// Succeeds even when nothing was removed.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(state): SharedState<R>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service.delete_product(&id).await?;

    Ok(Json(MessageResponse {
        message: "Product Deleted".to_string(),
        request: state.links.recreate(),
    }))
}

/// Collect `name`, `price` and the first `productImage` file part; other parts are ignored.
async fn read_create_form(mut multipart: Multipart) -> ProductResult<CreateProductForm> {
    let mut form = CreateProductForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "price" => form.price = Some(field.text().await?),
            IMAGE_FIELD if field.file_name().is_none() => {
                tracing::debug!("Ignoring {} part without a file name", IMAGE_FIELD)
            }
            IMAGE_FIELD if form.image.is_none() => form.image = Some(read_image(field).await?),
            IMAGE_FIELD => tracing::warn!("Ignoring additional {} part", IMAGE_FIELD),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Buffer a file part, failing as soon as it grows past [`MAX_IMAGE_BYTES`].
async fn read_image(mut field: Field<'_>) -> ProductResult<UploadedImage> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(ProductError::PayloadTooLarge {
                limit: MAX_IMAGE_BYTES,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedImage {
        file_name,
        content_type,
        bytes: bytes.into(),
    })
}
