//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::scheduler::SchedulerError;
use crate::service::ServiceError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Alarm store operation failed
    StoreError(String),

    /// The scheduler is stopped (e.g. mid state-load)
    SchedulerUnavailable(String),

    /// Invalid request parameters
    InvalidRequest(String),

    /// Missing or invalid credentials
    Unauthorized(&'static str),

    /// Internal server error
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::StoreError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::SchedulerUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(err) => ApiError::StoreError(err.to_string()),
            ServiceError::Scheduler(SchedulerError::NotRunning) => {
                ApiError::SchedulerUnavailable(SchedulerError::NotRunning.to_string())
            }
        }
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        ApiError::StoreError(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
