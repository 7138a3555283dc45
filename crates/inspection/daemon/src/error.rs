//! Error types for inspection-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inspection_engine::{EngineError, StorageError};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown `X-User-Id`
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller lacks the role, ownership or an active account
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed path, query or multipart input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict with the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::Authorization(msg) => ApiError::Forbidden(msg),
            EngineError::Conflict(msg) => ApiError::Conflict(msg),
            EngineError::NotFound(msg) => ApiError::NotFound(msg),
            other @ (EngineError::Storage(_) | EngineError::Blob(_)) => {
                tracing::error!(error = %other, "Request failed in backend");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
