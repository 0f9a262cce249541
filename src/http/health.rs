//! Liveness endpoint.

use axum::http::StatusCode;

/// Body is exactly `ok`; no readiness logic.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
