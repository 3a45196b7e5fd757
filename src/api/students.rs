use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use super::{MessageResponse, present};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{NewStudentRequest, Student, StudentStatus, UpdateStudentRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct StudentQuery {
    class: Option<String>,
}

fn parse_status(raw: &str) -> Result<StudentStatus, AppError> {
    StudentStatus::parse(raw).ok_or_else(|| {
        AppError::Validation("Status must be either Active or Inactive".to_string())
    })
}

async fn resolve_class_id(state: &AppState, class_name: &str) -> Result<i64, AppError> {
    repository::find_class_ref_by_name(&state.db, class_name)
        .await?
        .map(|class| class.id)
        .ok_or_else(|| AppError::UnknownClass(class_name.to_string()))
}

pub(super) async fn list_students(
    State(state): State<AppState>,
    query: Result<Query<StudentQuery>, QueryRejection>,
) -> Result<Json<Vec<Student>>, AppError> {
    let Query(query) = query?;
    let students = match present(query.class) {
        Some(class_name) => repository::fetch_students_by_class(&state.db, &class_name).await?,
        None => repository::fetch_students(&state.db).await?,
    };
    Ok(Json(students))
}

pub(super) async fn create_student(
    State(state): State<AppState>,
    body: Result<Json<NewStudentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let Json(req) = body?;
    let (Some(name), Some(class_name)) = (present(req.name), present(req.class_name)) else {
        return Err(AppError::Validation(
            "Name and class are required".to_string(),
        ));
    };
    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => StudentStatus::default(),
    };
    let class_id = resolve_class_id(&state, &class_name).await?;
    let email = present(req.email);

    let student =
        repository::insert_student(&state.db, &name, class_id, email.as_deref(), status).await?;
    info!("enrolled student {} in {}", student.id, student.class_name);
    Ok((StatusCode::CREATED, Json(student)))
}

pub(super) async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateStudentRequest>, JsonRejection>,
) -> Result<Json<Student>, AppError> {
    let Json(req) = body?;

    let existing = repository::find_student_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let class_id = match present(req.class_name) {
        Some(class_name) if class_name != existing.class_name => {
            Some(resolve_class_id(&state, &class_name).await?)
        }
        _ => None,
    };
    let status = req.status.as_deref().map(parse_status).transpose()?;
    let name = present(req.name);

    let student = repository::update_student(
        &state.db,
        id,
        name.as_deref(),
        class_id,
        present(req.email).as_deref(),
        status,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    Ok(Json(student))
}

pub(super) async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !repository::delete_student(&state.db, id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }
    info!("deleted student {}", id);
    Ok(Json(MessageResponse::new("Student deleted successfully")))
}
