//! # API Error Type
//!
//! Unified error type for dashboard handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Dashboard                          │
//! │                                                                         │
//! │  Handler                                                               │
//! │  Result<T, ApiError>  or  RecordError::into_response (create sale)     │
//! │         │                                                               │
//! │         ├── DbError::NotFound ──────────► 404 { code, message }        │
//! │         ├── DbError::(anything else) ───► 500, details logged only     │
//! │         ├── no identity ────────────────► 401                          │
//! │         │                                                               │
//! │         └── RecordError (create sale)                                  │
//! │               ├── Validation ───► 422 SalesFormState { errors, message }│
//! │               ├── Persistence ──► 500 SalesFormState { message }       │
//! │               └── Authentication ► 401 { code, message }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_db::DbError;

use crate::recorder::RecordError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Sale not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// No session identity (401)
    Unauthorized,

    /// Database operation failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }
}

/// Converts database errors to API errors.
///
/// Only `NotFound` is passed through; everything else is logged and
/// replaced by a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(entity, &id),
            DbError::Connection(reason) => {
                tracing::error!(%reason, "Database unavailable");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        match self {
            RecordError::Authentication(reason) => {
                ApiError::unauthorized(format!("Authentication error: {reason}")).into_response()
            }
            RecordError::Validation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(self.form_state())).into_response()
            }
            RecordError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(self.form_state())).into_response()
            }
        }
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
