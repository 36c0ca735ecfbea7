//! HTTP handlers.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod marks;
pub mod metrics;
pub mod students;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Fallback for unmatched routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
}
