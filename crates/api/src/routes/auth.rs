//! Login, registration and current-user endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use common::{RecordId, Role};
use domain::{LoginRequest, RegisterRequest};
use serde::Serialize;
use serde_json::{Value, json};
use store::{SchoolStore, User};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

/// The public view of an account returned on login.
#[derive(Serialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// POST /api/auth/login
#[tracing::instrument(skip_all)]
pub async fn login<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let outcome = state.auth.login(req).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": outcome.token,
        "user": UserSummary::from(outcome.user),
    })))
}

/// POST /api/auth/register
#[tracing::instrument(skip_all)]
pub async fn register<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = payload?;
    let user = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": UserSummary::from(user),
        })),
    ))
}

/// GET /api/auth/me
#[tracing::instrument(skip_all, fields(user_id = %user.0.id))]
pub async fn me<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let me = state.auth.me(&user.0).await?;

    Ok(Json(json!({
        "message": "User retrieved successfully",
        "user": me,
    })))
}
