//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::validation::FieldError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more request fields failed validation.
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token was supplied.
    #[error("Access token required")]
    Unauthenticated,

    /// The bearer token failed verification.
    #[error("Invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// The caller's role or identity does not grant access.
    #[error("Access denied")]
    Forbidden,

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule would be violated.
    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// A token could not be signed.
    #[error("Token encoding error: {0}")]
    Token(#[source] jsonwebtoken::errors::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
