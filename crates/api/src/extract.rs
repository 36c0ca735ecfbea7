//! Request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::{RecordId, Role};
use domain::{DomainError, Principal};
use store::SchoolStore;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller identified by a verified `Authorization: Bearer` token.
///
/// A missing or malformed header rejects with 401, a token that fails
/// verification with 403.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        Ok(self.0.require_any(roles)?)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: SchoolStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(DomainError::Unauthenticated)?;
        let principal = state.auth.authenticate(token)?;
        Ok(AuthUser(principal))
    }
}

/// Parses a record id from a path segment.
pub fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidId(raw.to_string()))
}
