use mongodb::{Client, bson::doc};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error text when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Send `{ ping: 1 }` to the admin database and return the round trip time.
pub async fn ping(client: &Client) -> Result<Duration, mongodb::error::Error> {
    let start = Instant::now();
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;
    Ok(start.elapsed())
}

pub async fn check_health(client: &Client) -> bool {
    ping(client).await.is_ok()
}

/// Like [`check_health`] but keeps the latency and the failure reason.
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();

    match ping(client).await {
        Ok(elapsed) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms: elapsed.as_millis() as u64,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms: start.elapsed().as_millis() as u64,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running MongoDB
    async fn test_check_health_detailed() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let status = check_health_detailed(&client).await;
        assert!(status.healthy);
        assert!(status.message.is_none());
    }
}
