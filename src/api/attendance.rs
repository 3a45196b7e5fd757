use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceSummary, RosterEntry, SaveAttendanceRequest};
use crate::services::attendance::require_key;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct ClassDayQuery {
    class_name: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SaveAttendanceResponse {
    message: String,
    records: Vec<AttendanceRecord>,
}

pub(super) async fn list_attendance(
    State(state): State<AppState>,
    query: Result<Query<ClassDayQuery>, QueryRejection>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let Query(query) = query?;
    let (class_name, date) = require_key(query.class_name, query.date)?;
    let records = state.attendance.list(&class_name, date).await?;
    Ok(Json(records))
}

pub(super) async fn save_attendance(
    State(state): State<AppState>,
    body: Result<Json<SaveAttendanceRequest>, JsonRejection>,
) -> Result<Json<SaveAttendanceResponse>, AppError> {
    let Json(req) = body?;
    let records = state.attendance.reconcile(req).await?;
    Ok(Json(SaveAttendanceResponse {
        message: "Attendance saved successfully".to_string(),
        records,
    }))
}

pub(super) async fn roster(
    State(state): State<AppState>,
    query: Result<Query<ClassDayQuery>, QueryRejection>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    let Query(query) = query?;
    let (class_name, date) = require_key(query.class_name, query.date)?;
    Ok(Json(state.attendance.roster(&class_name, date).await?))
}

pub(super) async fn summary(
    State(state): State<AppState>,
    query: Result<Query<ClassDayQuery>, QueryRejection>,
) -> Result<Json<AttendanceSummary>, AppError> {
    let Query(query) = query?;
    let (class_name, date) = require_key(query.class_name, query.date)?;
    Ok(Json(state.attendance.summary(&class_name, date).await?))
}
