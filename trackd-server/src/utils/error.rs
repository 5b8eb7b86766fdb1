//! Unified error handling
//!
//! Provides the application-level error type and its HTTP mapping:
//! - [`AppError`] - application error enum
//! - [`ErrorBody`] - JSON error payload
//!
//! # Error code scheme
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx | Request / business errors | E0003 not found |
//! | E2xxx | Permission errors | E2001 forbidden |
//! | E3xxx | Authentication errors | E3001 not signed in |
//! | E8xxx | Upstream service errors | E8001 service unavailable |
//! | E9xxx | System errors | E9001 internal error |
//!
//! # Usage
//!
//! ```ignore
//! Err(AppError::not_found("Job 42 not found"))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// JSON error payload
///
/// ```json
/// {
///   "code": "E0002",
///   "message": "Validation failed",
///   "details": [{ "field": "revenue", "message": "revenue must be non-negative" }]
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Field errors (validation failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication / authorization (4xx) ==========
    /// Not signed in (401)
    #[error("Authentication required")]
    Unauthorized,

    /// No permission for the target resource (403)
    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business logic (4xx) ==========
    /// Resource missing or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource conflict (409)
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// Malformed request body, reported per field (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Malformed request outside field validation (400)
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Allowed request shape, disallowed by business state (422)
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== Upstream services (5xx) ==========
    /// External dependency failed or timed out (503)
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    // ========== System errors (5xx) ==========
    /// Database failure (500)
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;

        let (status, code, message) = match self {
            // Authentication errors (401)
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E3001",
                "Please sign in first".to_string(),
            ),

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg),

            // Validation (400, field errors attached)
            AppError::Validation(errors) => {
                details = Some(errors);
                (
                    StatusCode::BAD_REQUEST,
                    "E0002",
                    "Validation failed".to_string(),
                )
            }

            // Invalid request (400)
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006", msg),

            // Business rule (422)
            AppError::BusinessRule(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg),

            // Upstream failures (503, provider message surfaced)
            AppError::Upstream { service, message } => {
                error!(target: "upstream", service = service, error = %message, "Upstream service error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "E8001",
                    format!("{service} unavailable: {message}"),
                )
            }

            // Database errors (500, detail stays in the log)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }

            // Internal errors (500, detail stays in the log)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorBody {
            code: code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

// ========== Helper constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn upstream(service: &'static str, msg: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: msg.into(),
        }
    }

    /// Single-field validation failure.
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.into(),
            message: msg.into(),
        }])
    }
}
