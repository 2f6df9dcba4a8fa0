use axum::{http::StatusCode, Json};
use chrono::Utc;

use crate::models::chat::HealthResponse;

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "success".to_string(),
            message: "Service is healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
