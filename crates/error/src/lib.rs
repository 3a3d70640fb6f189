pub mod middleware_handling;

mod macros;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level validation failure, keyed by the offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    ConfigError(anyhow::Error),
    DatabaseError(anyhow::Error),
    ServerError(anyhow::Error),
    ValidationError(String),
    FieldErrors(Vec<FieldError>),
    DuplicateError(FieldError),
    NotFoundError(String),
    AuthenticationError(String),
    AuthorizationError(String),
    MailError(String),
}

impl AppError {
    // User-friendly authentication errors
    pub fn invalid_credentials() -> Self {
        Self::AuthenticationError("Invalid credentials.".to_string())
    }

    pub fn token_expired() -> Self {
        Self::AuthenticationError(
            "Signature expired. Please log in again.".to_string(),
        )
    }

    pub fn token_invalid() -> Self {
        Self::AuthenticationError("Invalid token. Please log in again.".to_string())
    }

    pub fn missing_authorization() -> Self {
        Self::AuthorizationError("No authorization.".to_string())
    }

    // Resource errors
    pub fn resource_not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFoundError(format!(
            "{} with identifier '{}' was not found.",
            resource_type, identifier
        ))
    }

    pub fn duplicate(field: &str, message: &str) -> Self {
        Self::DuplicateError(FieldError::new(field, message))
    }

    // Validation errors
    pub fn validation(field: &str, message: &str) -> Self {
        Self::FieldErrors(vec![FieldError::new(field, message)])
    }
}

impl std::error::Error for AppError {}

// Convert from various error types to AppError
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

// Human-friendly error messages
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Self::DatabaseError(e) => write!(f, "Database error: {}", e),
            Self::ServerError(e) => write!(f, "Server error: {}", e),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::FieldErrors(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Validation error: {}", joined)
            }
            Self::DuplicateError(e) => write!(f, "Duplicate error: {}: {}", e.field, e.message),
            Self::NotFoundError(msg) => write!(f, "Not found: {}", msg),
            Self::AuthenticationError(msg) => write!(f, "Authentication error: {}", msg),
            Self::AuthorizationError(msg) => write!(f, "Authorization error: {}", msg),
            Self::MailError(msg) => write!(f, "Mail error: {}", msg),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code, field_errors) = match &self {
            Self::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "System configuration error".to_string(),
                "CONFIG_ERROR",
                None,
            ),
            Self::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, please try again.".to_string(),
                "DB_ERROR",
                None,
            ),
            Self::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, please try again.".to_string(),
                "SERVER_ERROR",
                None,
            ),
            Self::MailError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while trying to send you an email. Please try again."
                    .to_string(),
                "MAIL_ERROR",
                None,
            ),
            Self::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                "VALIDATION_ERROR",
                None,
            ),
            Self::FieldErrors(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed.".to_string(),
                "VALIDATION_ERROR",
                Some(errors.clone()),
            ),
            Self::DuplicateError(error) => (
                StatusCode::BAD_REQUEST,
                error.message.clone(),
                "DUPLICATE",
                Some(vec![error.clone()]),
            ),
            Self::NotFoundError(msg) => {
                (StatusCode::NOT_FOUND, msg.clone(), "NOT_FOUND", None)
            }
            Self::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTH_ERROR", None)
            }
            Self::AuthorizationError(msg) => {
                (StatusCode::FORBIDDEN, msg.clone(), "FORBIDDEN", None)
            }
        };

        // Internal detail stays in the logs, never in the response body
        if status.is_server_error() {
            tracing::error!(error_code, status_code = %status.as_u16(), "{}", self);
        } else {
            tracing::warn!(error_code, status_code = %status.as_u16(), "{}", self);
        }

        let body = Json(ErrorResponse {
            status: status.to_string(),
            message: error_message,
            code: error_code.to_string(),
            details: if status == StatusCode::INTERNAL_SERVER_ERROR {
                None
            } else {
                Some(self.to_string())
            },
            errors: field_errors,
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap foreign errors with a specific variant
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn db_err(self) -> AppResult<T>;
    fn server_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn db_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::DatabaseError(e.into()))
    }

    fn server_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ServerError(e.into()))
    }
}
