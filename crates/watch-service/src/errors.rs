//! Watch Service error types.
//!
//! `WatchError` is the API-facing error and maps to HTTP status codes via the
//! `IntoResponse` impl. Database details are logged server-side and never
//! returned to clients.
//!
//! `CheckError` covers the ways a single fetch-and-check can fail. Check
//! failures are local to the check: they are logged by the owning scheduler
//! loop and never reach the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Watch Service error type.
///
/// Maps to HTTP status codes:
/// - Database, Internal: 500 Internal Server Error
/// - BadRequest: 400 Bad Request
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl WatchError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WatchError::Database(_) | WatchError::Internal => 500,
            WatchError::BadRequest(_) => 400,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for WatchError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WatchError::Database(err) => {
                tracing::error!(target: "watch.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            WatchError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            WatchError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to WatchError
impl From<sqlx::Error> for WatchError {
    fn from(err: sqlx::Error) -> Self {
        WatchError::Database(err.to_string())
    }
}

/// Failure of a single fetch-and-check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The fetch did not complete within the check timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Transport failure, non-success status, or body read failure.
    #[error("failed to fetch data from URL: {0}")]
    Fetch(String),

    /// Response claimed `application/json` but the body did not parse.
    #[error("failed to parse JSON response: {0}")]
    InvalidJson(String),

    /// The match store rejected the write.
    #[error("failed to insert data into store: {0}")]
    Persistence(String),
}

impl CheckError {
    /// Bounded label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Timeout(_) => "timeout",
            CheckError::Fetch(_) => "fetch_error",
            CheckError::InvalidJson(_) => "invalid_json",
            CheckError::Persistence(_) => "persistence_error",
        }
    }
}
