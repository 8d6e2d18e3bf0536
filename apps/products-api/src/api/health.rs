//! Readiness endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};
use serde_json::Value;

use crate::state::AppState;

/// `GET /ready`: MongoDB answers a ping and the upload directory exists.
async fn ready(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "mongodb",
            Box::pin(async {
                database::mongodb::ping(&state.mongo_client)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "uploads",
            Box::pin(async {
                match tokio::fs::metadata(&state.config.upload_dir).await {
                    Ok(meta) if meta.is_dir() => Ok(()),
                    Ok(_) => Err(format!(
                        "{} is not a directory",
                        state.config.upload_dir.display()
                    )),
                    Err(e) => Err(e.to_string()),
                }
            }),
        ),
    ];

    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(ready)).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use axum::body::Body;
    use axum::http::Request;
    use core_config::{app_info, server::ServerConfig};
    use database::mongodb::MongoConfig;
    use http_body_util::BodyExt;
    use mongodb::Client;
    use tower::ServiceExt;

    const UNREACHABLE: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";

    async fn state_with_uploads(upload_dir: std::path::PathBuf) -> AppState {
        let mongo_client = Client::with_uri_str(UNREACHABLE).await.unwrap();
        let db = mongo_client.database("shop");

        AppState {
            config: Config {
                app: app_info!(),
                mongodb: MongoConfig::with_database(UNREACHABLE, "shop"),
                server: ServerConfig::default(),
                environment: Environment::Development,
                upload_dir,
                public_base_url: "http://localhost:8080".to_string(),
            },
            mongo_client,
            db,
        }
    }

    async fn get_ready(state: AppState) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ready_reports_unreachable_mongodb() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_ready(state_with_uploads(dir.path().to_path_buf()).await).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["mongodb"], "disconnected");
        assert_eq!(body["uploads"], "connected");
    }

    #[tokio::test]
    async fn test_ready_reports_missing_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_ready(state_with_uploads(dir.path().join("missing")).await).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["uploads"], "disconnected");
    }
}
