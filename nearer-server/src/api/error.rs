//! API error responses

use crate::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed command or payload (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Session id not connected (404)
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Track reference cannot be resolved (422)
    #[error("{0}")]
    Resolution(String),

    /// Stream stayed unavailable after retrying (503)
    #[error("{0}")]
    StreamUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::BadRequest(msg) | Error::InvalidCommand(msg) => ApiError::BadRequest(msg),
            Error::UnknownSession(id) => ApiError::UnknownSession(id.to_string()),
            err @ Error::Resolution { .. } => ApiError::Resolution(err.to_string()),
            err @ Error::StreamUnavailable { .. } => ApiError::StreamUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::UnknownSession(msg) => (StatusCode::NOT_FOUND, "UNKNOWN_SESSION", msg),
            ApiError::Resolution(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "RESOLUTION_FAILED", msg)
            }
            ApiError::StreamUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STREAM_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
