use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use super::{MessageResponse, is_unique_violation, present};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Class, NewClassRequest, UpdateClassRequest};
use crate::state::AppState;

const DUPLICATE_NAME: &str = "Class with this name already exists";

pub(super) async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_classes(&state.db).await?;
    Ok(Json(classes))
}

pub(super) async fn create_class(
    State(state): State<AppState>,
    body: Result<Json<NewClassRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let Json(req) = body?;
    let (Some(name), Some(teacher)) = (present(req.name), present(req.teacher)) else {
        return Err(AppError::Validation(
            "Name and teacher are required".to_string(),
        ));
    };
    let description = present(req.description);

    if repository::find_class_ref_by_name(&state.db, &name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(DUPLICATE_NAME.to_string()));
    }

    let class = repository::insert_class(&state.db, &name, &teacher, description.as_deref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(DUPLICATE_NAME.to_string())
            } else {
                AppError::Database(e)
            }
        })?;
    info!("created class {} ({})", class.name, class.id);
    Ok((StatusCode::CREATED, Json(class)))
}

pub(super) async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Class>, AppError> {
    let class = repository::find_class_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".to_string()))?;
    Ok(Json(class))
}

pub(super) async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateClassRequest>, JsonRejection>,
) -> Result<Json<Class>, AppError> {
    let Json(req) = body?;
    let name = present(req.name);
    let teacher = present(req.teacher);

    if let Some(name) = &name {
        if let Some(existing) = repository::find_class_ref_by_name(&state.db, name).await? {
            if existing.id != id {
                return Err(AppError::Conflict(DUPLICATE_NAME.to_string()));
            }
        }
    }

    let class = repository::update_class(
        &state.db,
        id,
        name.as_deref(),
        teacher.as_deref(),
        present(req.description).as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(DUPLICATE_NAME.to_string())
        } else {
            AppError::Database(e)
        }
    })?
    .ok_or_else(|| AppError::NotFound("Class not found".to_string()))?;
    Ok(Json(class))
}

pub(super) async fn delete_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let class = repository::find_class_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".to_string()))?;

    if repository::count_students_in_class(&state.db, class.id).await? > 0 {
        return Err(AppError::Validation(
            "Cannot delete class with enrolled students".to_string(),
        ));
    }

    repository::delete_class(&state.db, class.id).await?;
    info!("deleted class {} ({})", class.name, class.id);
    Ok(Json(MessageResponse::new("Class deleted successfully")))
}
