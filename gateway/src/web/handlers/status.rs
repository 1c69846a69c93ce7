// Health check endpoint

use axum::http::HeaderMap;
use axum::response::Json;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub message: &'static str,
    pub client_ip: String,
}

/// Simple connectivity check. The client address comes from the
/// proxy-supplied header; direct connections show up as "unknown".
pub async fn get_status(headers: HeaderMap) -> Json<HealthStatus> {
    let client_ip = headers
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    debug!("Health check from {}", client_ip);
    Json(HealthStatus {
        message: "You are successfully connected to the REST API server.",
        client_ip,
    })
}
