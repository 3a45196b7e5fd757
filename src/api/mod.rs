mod attendance;
mod classes;
mod search;
mod students;
mod teams;

use axum::routing::{get, post, put};
use axum::{Router, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/attendance",
            get(attendance::list_attendance).post(attendance::save_attendance),
        )
        .route("/attendance/roster", get(attendance::roster))
        .route("/attendance/summary", get(attendance::summary))
        .route("/classes", get(classes::list_classes).post(classes::create_class))
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/{id}",
            put(students::update_student).delete(students::delete_student),
        )
        .route("/search", get(search::search))
        .route("/teams/send-message", post(teams::send_message))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// Treats blank strings in optional request fields as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}
