//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler -> Result<Json<T>, ApiError>                                   │
//! │                                                                         │
//! │  DbError::NotFound ────────────┐                                        │
//! │  CoreError::InvalidSession ────┼──► ApiError { code, message }          │
//! │  ChipError::InvalidAmount ─────┤         │                              │
//! │  ValidationError ──────────────┘         ▼                              │
//! │                               IntoResponse: status from code            │
//! │                               body {"code":"NOT_FOUND","message":"..."} │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged with their detail and answered with a
//! generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pokernight_core::{ChipError, CoreError, ValidationError};
use pokernight_db::DbError;

/// API error returned from handlers.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Session not found: sid_20240105_1" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
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

    /// Input validation failed (400)
    ValidationError,

    /// Operation not allowed in the resource's current state (400)
    InvalidState,

    /// Duplicate or already-done (409)
    Conflict,

    /// Missing or bad admin credentials (401)
    Unauthorized,

    /// Admin login not configured on this server (503)
    AdminDisabled,

    /// Chip set misconfigured (500)
    ConfigurationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InvalidState => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::AdminDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ConfigurationError | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConstraintViolation(message) => {
                tracing::warn!("Constraint violation: {}", message);
                ApiError::validation("Value out of range")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ChipError> for ApiError {
    fn from(err: ChipError) -> Self {
        if err.is_client_error() {
            ApiError::validation(err.to_string())
        } else {
            tracing::error!(error = %err, "Chip set misconfigured");
            ApiError::new(ErrorCode::ConfigurationError, err.to_string())
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSessionStatus { .. } | CoreError::EventCancelled { .. } => {
                ApiError::new(ErrorCode::InvalidState, err.to_string())
            }
            CoreError::EntryNotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            CoreError::EventAlreadyStarted { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            CoreError::Chip(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
