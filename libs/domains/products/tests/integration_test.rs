//! Integration tests for the products domain against a real MongoDB
//!
//! Run with `cargo test -p domain_products -- --ignored` (requires Docker).

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestMongo};
use tower::ServiceExt;
use uuid::Uuid;

const BASE: &str = "http://localhost:8080/api/products";

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn form(name: &str, price: f64, image: Option<UploadedImage>) -> CreateProductForm {
    CreateProductForm {
        name: Some(name.to_string()),
        price: Some(price.to_string()),
        image,
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_repository_crud_cycle() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("repository_crud_cycle");
    let repo = MongoProductRepository::new(&mongo.database(&builder.database_name()));

    let created = repo
        .create(NewProduct {
            name: builder.name("product", "lamp"),
            price: builder.price(0),
            image_path: None,
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let changes = ProductChanges::from_patches(vec![ProductPatch::Price(42.0)]);
    assert_eq!(repo.update_fields(created.id, changes).await.unwrap(), 1);

    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.price, 42.0);
    assert_eq!(fetched.name, created.name);

    assert_eq!(repo.delete(created.id).await.unwrap(), 1);
    assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    assert_eq!(repo.delete(created.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_ids_unique_and_stable() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("service_ids_unique");
    let uploads = tempfile::tempdir().unwrap();

    let service = ProductService::new(
        MongoProductRepository::new(&mongo.database(&builder.database_name())),
        Arc::new(DiskImageStore::new(uploads.path())),
    );

    let mut ids = Vec::new();
    for i in 0..5 {
        let created = service
            .create_product(form(&builder.name("product", &i.to_string()), builder.price(i), None))
            .await
            .unwrap();
        ids.push(created.product.id);
    }

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    for id in &ids {
        let first = service.get_product(&id.to_string()).await.unwrap();
        let second = service.get_product(&id.to_string()).await.unwrap();
        assert_eq!(first.id, *id);
        assert_eq!(first, second);
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_image_upload_policy() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("service_image_upload");
    let uploads = tempfile::tempdir().unwrap();

    let service = ProductService::new(
        MongoProductRepository::new(&mongo.database(&builder.database_name())),
        Arc::new(DiskImageStore::new(uploads.path())),
    );

    let png = UploadedImage {
        file_name: "lamp.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: Bytes::from_static(b"\x89PNG\r\n"),
    };
    let created = service
        .create_product(form("Lamp", 20.0, Some(png)))
        .await
        .unwrap();

    let path = created.product.image_path.clone().unwrap();
    assert!(path.ends_with("lamp.png"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG\r\n");
    assert_eq!(created.image_upload, Some(UploadOutcome::Accepted { path }));

    let gif = UploadedImage {
        file_name: "lamp.gif".to_string(),
        content_type: Some("image/gif".to_string()),
        bytes: Bytes::from_static(b"GIF89a"),
    };
    let created = service
        .create_product(form("Gif Lamp", 20.0, Some(gif)))
        .await
        .unwrap();

    let stored = service
        .get_product(&created.product.id.to_string())
        .await
        .unwrap();
    assert!(stored.image_path.is_none());
    assert!(matches!(
        created.image_upload,
        Some(UploadOutcome::Rejected { .. })
    ));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_http_lifecycle() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("http_lifecycle");
    let uploads = tempfile::tempdir().unwrap();

    let service = ProductService::new(
        MongoProductRepository::new(&mongo.database(&builder.database_name())),
        Arc::new(DiskImageStore::new(uploads.path())),
    );
    let app = handlers::router(service, ResourceLinks::new(BASE));

    let mut created_ids = Vec::new();
    for (name, price) in [("Lamp", "20"), ("Desk", "150.5"), ("Chair", "45")] {
        let body = format!(
            "--B\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n\
             --B\r\nContent-Disposition: form-data; name=\"price\"\r\n\r\n{price}\r\n--B--\r\n"
        );
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "multipart/form-data; boundary=B")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response.into_body()).await;
        created_ids.push(json["createdProduct"]["id"].as_str().unwrap().to_string());
    }

    // Delete the desk
    let desk = &created_ids[1];
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/{desk}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::get(format!("/{desk}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Patch the chair's price only
    let chair = &created_ids[2];
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{chair}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!([{ "propName": "price", "value": 42 }]).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // List reflects exactly the remaining products
    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(response.into_body()).await;
    assert_eq!(json["count"], 2);

    let products = json["products"].as_array().unwrap();
    let mut listed: Vec<&str> = products.iter().map(|p| p["id"].as_str().unwrap()).collect();
    listed.sort();
    let mut expected = vec![created_ids[0].as_str(), chair.as_str()];
    expected.sort();
    assert_eq!(listed, expected);

    for product in products {
        let mut keys: Vec<&str> = product.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["id", "imagePath", "name", "price", "request"]);
    }

    let chair_entry = products.iter().find(|p| p["id"] == chair.as_str()).unwrap();
    assert_eq!(chair_entry["price"], 42.0);
    assert_eq!(chair_entry["name"], "Chair");

    // Patch and delete on an unknown id still succeed
    let ghost = Uuid::now_v7();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/{ghost}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!([{ "propName": "name", "value": "Ghost" }]).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/{ghost}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
