//! Mark CRUD and Excel download endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use common::Role;
use domain::{AddMarkRequest, UpdateMarkRequest};
use reports::{Export, XLSX_CONTENT_TYPE};
use serde_json::{Value, json};
use store::SchoolStore;

use crate::error::ApiError;
use crate::extract::{AuthUser, parse_id};
use crate::state::AppState;

const STAFF: &[Role] = &[Role::Admin, Role::Teacher];
const EVERYONE: &[Role] = &Role::ALL;

/// Sends a workbook as a file download.
fn attachment(export: Export) -> Response {
    // File names are free of control characters, so only UTF-8 bytes remain
    // for `from_bytes` to accept as opaque header text.
    let disposition =
        HeaderValue::from_bytes(format!("attachment; filename={}", export.file_name).as_bytes())
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response()
}

/// GET /api/marks — admin, teacher. Each mark carries its student's name and email.
#[tracing::instrument(skip_all)]
pub async fn list<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    user.require_any(STAFF)?;
    let marks = state.exports.marks_with_students().await?;

    Ok(Json(json!({
        "message": "Marks retrieved successfully",
        "marks": marks,
    })))
}

/// POST /api/marks — teacher.
#[tracing::instrument(skip_all, fields(teacher_id = %user.0.id))]
pub async fn create<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<AddMarkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    user.require_any(&[Role::Teacher])?;
    let Json(req) = payload?;
    let mark = state.marks.add(&user.0, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Mark added successfully",
            "mark": mark,
        })),
    ))
}

/// GET /api/marks/download — teacher, admin.
#[tracing::instrument(skip_all)]
pub async fn download_all<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    user.require_any(STAFF)?;
    let export = state.exports.all_marks().await?;
    Ok(attachment(export))
}

/// GET /api/marks/student/{studentId} — any role; students only see their own.
#[tracing::instrument(skip_all)]
pub async fn for_student<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(student_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(EVERYONE)?;
    let record = state
        .marks
        .for_student(&user.0, parse_id(&student_id)?)
        .await?;

    Ok(Json(json!({
        "message": "Student marks retrieved successfully",
        "student": record.student,
        "marks": record.marks,
    })))
}

/// GET /api/marks/student/{studentId}/download — any role; students only export their own.
#[tracing::instrument(skip_all)]
pub async fn download_for_student<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(student_id): Path<String>,
) -> Result<Response, ApiError> {
    user.require_any(EVERYONE)?;
    let export = state
        .exports
        .student_marks(&user.0, parse_id(&student_id)?)
        .await?;
    Ok(attachment(export))
}

/// GET /api/marks/{id} — admin, teacher.
#[tracing::instrument(skip_all)]
pub async fn get<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(STAFF)?;
    let mark = state.marks.get(parse_id(&id)?).await?;

    Ok(Json(json!({
        "message": "Mark retrieved successfully",
        "mark": mark,
    })))
}

/// PUT /api/marks/{id} — teacher.
#[tracing::instrument(skip_all)]
pub async fn update<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMarkRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Teacher])?;
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let mark = state.marks.update(id, req).await?;

    Ok(Json(json!({
        "message": "Mark updated successfully",
        "mark": mark,
    })))
}

/// DELETE /api/marks/{id} — teacher.
#[tracing::instrument(skip_all)]
pub async fn delete<S: SchoolStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_any(&[Role::Teacher])?;
    state.marks.delete(parse_id(&id)?).await?;

    Ok(Json(json!({ "message": "Mark deleted successfully" })))
}
