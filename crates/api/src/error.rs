//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use reports::ReportError;
use serde_json::json;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Report(#[from] ReportError),

    /// A path segment is not a valid record id.
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// The request body could not be read as JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

fn internal(err: &dyn std::error::Error) -> Response {
    tracing::error!(error = %err, "internal server error");
    message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Report(ReportError::Domain(err)) => domain_error_to_response(err),
            ApiError::Report(err @ ReportError::Xlsx(_)) => internal(&err),
            err @ (ApiError::InvalidId(_) | ApiError::BadRequest(_)) => {
                message(StatusCode::BAD_REQUEST, err.to_string())
            }
        }
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(errors) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
        }
        DomainError::Conflict(msg) => message(StatusCode::BAD_REQUEST, msg),
        DomainError::InvalidCredentials | DomainError::Unauthenticated => {
            message(StatusCode::UNAUTHORIZED, err.to_string())
        }
        DomainError::InvalidToken(_) | DomainError::Forbidden => {
            message(StatusCode::FORBIDDEN, err.to_string())
        }
        DomainError::NotFound { .. } => message(StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Store(_)
        | DomainError::Hashing(_)
        | DomainError::Token(_)
        | DomainError::Task(_) => internal(&err),
    }
}
