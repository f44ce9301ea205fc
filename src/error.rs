// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failure of a single request to the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Typed failures of the grading and progress operations.
/// Callers must handle each kind; none is swallowed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("activity {activity_id} has no questions")]
    NoQuestions { activity_id: i64 },

    #[error("unanswered questions: {missing:?}")]
    IncompleteSubmission { missing: Vec<i64> },

    #[error("failed to persist results: {0}")]
    Persistence(#[source] StoreError),

    #[error("progress data unavailable: {0}")]
    DataUnavailable(#[source] StoreError),

    #[error("{0} not found")]
    NotFound(String),
}

/// Global Application Error Enum.
/// Maps service failures to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., resubmitting a completed activity)
    Conflict(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Service Unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "could not load progress".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NoQuestions { .. } => {
                AppError::BadRequest("this activity has no questions yet".to_string())
            }
            ServiceError::IncompleteSubmission { .. } => {
                AppError::BadRequest("answer all questions before submitting".to_string())
            }
            ServiceError::Persistence(cause) => AppError::InternalServerError(cause.to_string()),
            ServiceError::DataUnavailable(cause) => AppError::ServiceUnavailable(cause.to_string()),
            ServiceError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
