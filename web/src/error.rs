//! Error types for web handlers.
//!
//! [`AppError`] bridges [`TodoError`] and HTTP responses. The body is always
//! `{"code": ..., "message": ...}`; internal details never reach the client
//! and are logged instead.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use todokv_core::{ErrorKind, TodoError};

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Todo>, AppError> {
///     let todo = state.service().get(&ctx, &id)?;
///     Ok(Json(todo))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
    /// Corruption or a bug rather than a refused request
    unexpected: bool,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
            unexpected: status == StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message, "CONFLICT")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message,
            "SERVICE_UNAVAILABLE",
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Whether the error signals corruption or a bug. Logged at `error`.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        self.unexpected
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match (&self.source, self.status) {
            (source, status) if self.unexpected => {
                tracing::error!(
                    status = %status,
                    code = self.code,
                    error = source.as_ref().map(tracing::field::debug),
                    "Internal server error"
                );
            }
            (Some(source), status) if status.is_server_error() => {
                tracing::warn!(status = %status, code = self.code, error = %source, "Request not served");
            }
            (source, status) => {
                tracing::debug!(
                    status = %status,
                    code = self.code,
                    error = source.as_ref().map(tracing::field::display),
                    "Request rejected"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map domain errors onto statuses by their kind.
impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        let app = match err.kind() {
            ErrorKind::InvalidInput => match err {
                TodoError::MissingId => Self::bad_request("missing id"),
                _ => Self::bad_request("invalid title"),
            },
            ErrorKind::NotFound => Self::not_found("not found"),
            ErrorKind::Conflict => Self::conflict("conflict"),
            ErrorKind::Unavailable => Self::unavailable("service unavailable"),
            ErrorKind::Internal => Self::internal("internal error"),
        };
        let unexpected = err.is_unexpected();
        Self {
            unexpected,
            ..app.with_source(anyhow::Error::new(err))
        }
    }
}

/// Malformed or incomplete JSON bodies.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("invalid request").with_source(anyhow::Error::new(rejection))
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("internal error").with_source(err)
    }
}
