use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A class named in a request body does not exist.
    #[error("Class does not exist: {0}")]
    UnknownClass(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The write failed and its rollback could not be confirmed.
    #[error("Attendance for {class_name} on {date} partially written ({written} of {expected})")]
    PartialApply {
        class_name: String,
        date: String,
        written: usize,
        expected: usize,
    },

    #[error("Operation timed out")]
    Timeout,

    /// An outbound integration call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnknownClass(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::PartialApply { .. } | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Timeout)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = self.is_retryable();
        let message = match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg,
            AppError::UnknownClass(_) => "Class does not exist".to_string(),
            AppError::Database(e) => {
                error!("database error: {}", e);
                "Database error occurred".to_string()
            }
            err @ AppError::PartialApply { .. } => {
                error!("{}", err);
                "Attendance could not be saved consistently".to_string()
            }
            AppError::Timeout => "Operation timed out, please retry".to_string(),
            AppError::Upstream(details) => {
                error!("upstream error: {}", details);
                format!("Failed to send message to Teams: {}", details)
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message,
            retryable,
        });

        (status, body).into_response()
    }
}
