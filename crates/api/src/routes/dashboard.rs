//! Dashboard statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Role;
use serde_json::{Value, json};
use store::SchoolStore;

use crate::error::ApiError;
use crate::extract::{AuthUser, parse_id};
use crate::state::AppState;

/// GET /api/dashboard/stats — admin.
#[tracing::instrument(skip_all)]
pub async fn stats<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Admin])?;
    let stats = state.dashboard.stats().await?;

    Ok(Json(json!({
        "message": "Dashboard stats retrieved successfully",
        "stats": stats,
    })))
}

/// GET /api/dashboard/teachers — admin.
#[tracing::instrument(skip_all)]
pub async fn teachers<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Admin])?;
    let teachers = state.dashboard.teachers().await?;

    Ok(Json(json!({
        "message": "Teachers retrieved successfully",
        "teachers": teachers,
    })))
}

/// GET /api/dashboard/teacher/{teacherId}/stats — admin, teacher.
#[tracing::instrument(skip_all)]
pub async fn teacher_stats<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(teacher_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Admin, Role::Teacher])?;
    let stats = state.dashboard.teacher_stats(parse_id(&teacher_id)?).await?;

    Ok(Json(json!({
        "message": "Teacher stats retrieved successfully",
        "stats": stats,
    })))
}
