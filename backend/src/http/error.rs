//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::ConflictRecord;
use crate::scheduler::{FieldError, ScheduleError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Rejected fields of a validation error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Every colliding slot of a schedule conflict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<ConflictRecord>>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            conflicts: None,
        }
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<ConflictRecord>) -> Self {
        self.conflicts = Some(conflicts);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed body, query string or path segment
    BadRequest(String),
    /// Any failure reported by the schedule service
    Schedule(ScheduleError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Schedule(err) => match err {
                ScheduleError::Validation(_)
                | ScheduleError::Capacity { .. }
                | ScheduleError::Conflict(_) => StatusCode::BAD_REQUEST,
                ScheduleError::NotFound { .. } => StatusCode::NOT_FOUND,
                ScheduleError::Build(_) | ScheduleError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::BadRequest(msg) => ApiError::new("ValidationError", msg),
            AppError::Schedule(err) => {
                let base = ApiError::new(err.code(), err.to_string());
                match err {
                    ScheduleError::Validation(fields) => base.with_details(fields),
                    ScheduleError::Conflict(conflicts) => base.with_conflicts(conflicts),
                    ScheduleError::Build(_) | ScheduleError::Repository(_) => {
                        tracing::error!("{}", base.message);
                        base
                    }
                    _ => base,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Schedule(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
