//! Error taxonomy and the centralized response formatter
//!
//! Handlers never format user-facing error text themselves; they construct
//! an [`AppError`] and return it. The single [`IntoResponse`]
//! implementation below is the one place that decides the HTTP status,
//! the `"fail"`/`"error"` status label, and whether the payload is verbose
//! (development) or sanitized (production).
//!
//! Operational errors (not-found, validation, auth) surface their real
//! message. Anything else is logged server-side and reduced to a generic
//! message unless the service runs in development mode.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// How error payloads are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Verbose payloads including internal detail
    Development,
    /// Sanitized payloads for unexpected errors
    Production,
}

static ERROR_MODE: OnceCell<ErrorMode> = OnceCell::new();

/// Set the process-wide error rendering mode. Called once at startup;
/// later calls are ignored.
pub fn set_error_mode(mode: ErrorMode) {
    let _ = ERROR_MODE.set(mode);
}

pub(crate) fn error_mode() -> ErrorMode {
    *ERROR_MODE.get().unwrap_or(&ErrorMode::Production)
}

/// One violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field that failed validation
    pub field: String,
    /// Human-readable constraint message
    pub message: String,
}

impl FieldViolation {
    /// Create a violation for a field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// No document with the given identifier
    #[error("No {entity} found with that ID")]
    NotFound {
        /// Entity type name
        entity: &'static str,
        /// The identifier that missed
        id: String,
    },

    /// No route matched the request path
    #[error("Can't find {0} on this server")]
    RouteNotFound(String),

    /// One or more field constraints violated
    #[error("Invalid input data")]
    ValidationFailed(Vec<FieldViolation>),

    /// Unique-key conflict
    #[error("Duplicate field value: {value}. Please use another value")]
    Duplicate {
        /// Entity type name
        entity: &'static str,
        /// Field (or field group) that collided
        field: String,
        /// The conflicting value
        value: String,
    },

    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Storage layer failure
    #[error("{0}")]
    Store(#[from] StoreError),

    /// I/O failure (listener setup, serving)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration failure
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Result type alias using the application error.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Convenience constructor for a missing document.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Convenience constructor for a unique-key conflict.
    pub fn duplicate(
        entity: &'static str,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity,
            field: field.into(),
            value: value.into(),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Io(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The envelope status label: `"fail"` for client errors, `"error"`
    /// for server errors.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }

    /// Whether this is an expected, user-caused condition whose message is
    /// safe to surface in production.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(
            self,
            Self::Store(_) | Self::Io(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Build the response body for a given rendering mode.
    #[must_use]
    pub fn body(&self, mode: ErrorMode) -> ErrorBody {
        let message = if self.is_operational() || mode == ErrorMode::Development {
            self.to_string()
        } else {
            "Something went wrong".to_string()
        };
        let errors = match self {
            Self::ValidationFailed(violations) => Some(violations.clone()),
            _ => None,
        };
        let detail = match mode {
            ErrorMode::Development => Some(format!("{self:?}")),
            ErrorMode::Production => None,
        };
        ErrorBody {
            status: self.status_label(),
            message,
            errors,
            detail,
        }
    }
}

/// JSON body produced by the centralized formatter.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// `"fail"` or `"error"`
    pub status: &'static str,
    /// User-facing message
    pub message: String,
    /// Field-level violations (validation errors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
    /// Debug representation, development mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_operational() {
            tracing::debug!(status = %status, "request failed: {self}");
        } else {
            tracing::error!(status = %status, "unexpected error: {self}");
        }
        (status, Json(self.body(error_mode()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::not_found("Tour", "t1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationFailed(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::duplicate("User", "email", "a@b.c").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("no".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_label_fail_vs_error() {
        assert_eq!(AppError::not_found("Tour", "t1").status_label(), "fail");
        assert_eq!(AppError::BadRequest("x".into()).status_label(), "fail");
        assert_eq!(AppError::Internal("boom".into()).status_label(), "error");
    }

    #[test]
    fn test_operational_classification() {
        assert!(AppError::not_found("Tour", "t1").is_operational());
        assert!(AppError::ValidationFailed(vec![]).is_operational());
        assert!(!AppError::Internal("boom".into()).is_operational());
        assert!(!AppError::Store(StoreError::Serialization("x".into())).is_operational());
    }

    #[test]
    fn test_production_body_sanitizes_unexpected() {
        let body = AppError::Internal("connection string leaked".into())
            .body(ErrorMode::Production);
        assert_eq!(body.message, "Something went wrong");
        assert!(body.detail.is_none());
    }

    #[test]
    fn test_production_body_keeps_operational_message() {
        let body = AppError::not_found("Tour", "t1").body(ErrorMode::Production);
        assert_eq!(body.message, "No Tour found with that ID");
        assert_eq!(body.status, "fail");
    }

    #[test]
    fn test_development_body_is_verbose() {
        let body =
            AppError::Internal("connection string leaked".into()).body(ErrorMode::Development);
        assert_eq!(body.message, "connection string leaked");
        assert!(body.detail.is_some());
    }

    #[test]
    fn test_validation_body_lists_every_field() {
        let error = AppError::ValidationFailed(vec![
            FieldViolation::new("name", "A tour must have a name"),
            FieldViolation::new("price", "A tour must have a price"),
        ]);
        let body = error.body(ErrorMode::Production);
        let errors = body.errors.expect("violations");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "price");
    }

    #[test]
    fn test_duplicate_message() {
        let error = AppError::duplicate("Tour", "name", "Forest Hiker");
        assert_eq!(
            error.to_string(),
            "Duplicate field value: Forest Hiker. Please use another value"
        );
    }
}
