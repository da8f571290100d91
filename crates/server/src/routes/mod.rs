//! API route handlers
//!
//! Routes are organized by functionality:
//!
//! - `analyze`: the upload-analysis endpoint, the service's purpose
//! - `health`: health checks, readiness, and metrics
//!
//! The analyze route is a single-segment path capture; the static
//! infrastructure routes take precedence over it.

pub mod analyze;
pub mod health;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "retouch server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/{name}",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}
