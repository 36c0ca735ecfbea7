//! Student CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Role;
use domain::{AddStudentRequest, UpdateStudentRequest};
use serde_json::{Value, json};
use store::SchoolStore;

use crate::error::ApiError;
use crate::extract::{AuthUser, parse_id};
use crate::state::AppState;

const STAFF: &[Role] = &[Role::Admin, Role::Teacher];

/// GET /api/students — admin, teacher.
#[tracing::instrument(skip_all)]
pub async fn list<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    user.require_any(STAFF)?;
    let students = state.students.list().await?;

    Ok(Json(json!({
        "message": "Students retrieved successfully",
        "students": students,
    })))
}

/// POST /api/students — admin.
#[tracing::instrument(skip_all)]
pub async fn create<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<AddStudentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    user.require_any(&[Role::Admin])?;
    let Json(req) = payload?;
    let student = state.students.add(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Student added successfully",
            "student": student,
        })),
    ))
}

/// GET /api/students/email/{email} — a student looking up their own record.
#[tracing::instrument(skip_all)]
pub async fn get_by_email<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(email): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Student])?;
    let student = state.students.get_by_email(&user.0, &email).await?;

    Ok(Json(json!({
        "message": "Student retrieved successfully",
        "student": student,
    })))
}

/// GET /api/students/{id} — admin, teacher.
#[tracing::instrument(skip_all)]
pub async fn get<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(STAFF)?;
    let student = state.students.get(parse_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Student retrieved successfully",
        "student": student,
    })))
}

/// PUT /api/students/{id} — admin.
#[tracing::instrument(skip_all)]
pub async fn update<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStudentRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Admin])?;
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let student = state.students.update(id, req).await?;

    Ok(Json(json!({
        "message": "Student updated successfully",
        "student": student,
    })))
}

/// DELETE /api/students/{id} — admin. Also removes the student's marks and login.
#[tracing::instrument(skip_all)]
pub async fn delete<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Admin])?;
    state.students.delete(parse_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Student and associated marks deleted successfully",
    })))
}
