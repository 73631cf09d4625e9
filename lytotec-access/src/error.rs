//! Access layer error types

use reqwest::StatusCode;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Access layer error type
#[derive(Debug, Error)]
pub enum AccessError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied by the backend
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with another non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Backend rejected or failed the request
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain rule violation
    #[error(transparent)]
    App(#[from] AppError),
}

impl AccessError {
    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::InvalidResponse(_) | Self::Serialization(_) => ErrorCode::InvalidFormat,
            Self::Unauthorized => ErrorCode::NotAuthenticated,
            Self::Forbidden(_) => ErrorCode::PermissionDenied,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Status { status, .. } => ErrorCode::from_http_status(*status),
            Self::Backend(_) => ErrorCode::DatabaseError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::App(e) => e.code,
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::App(e) => e,
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}

/// Result type for access layer operations
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AccessError::Unauthorized.code(), ErrorCode::NotAuthenticated);
        assert_eq!(
            AccessError::Backend("boom".into()).code(),
            ErrorCode::DatabaseError
        );
        assert_eq!(
            AccessError::App(AppError::role_not_found("Apontador")).code(),
            ErrorCode::RoleNotFound
        );
    }

    #[test]
    fn test_status_errors_follow_http_mapping() {
        let status = |code: u16, body: &str| AccessError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: body.into(),
        };
        assert_eq!(status(409, "duplicate").code(), ErrorCode::AlreadyExists);
        assert_eq!(status(422, "bad filter").code(), ErrorCode::ValidationFailed);
        assert_eq!(status(502, "").code(), ErrorCode::NetworkError);
        assert_eq!(status(504, "").code(), ErrorCode::TimeoutError);
        assert_eq!(status(500, "").code(), ErrorCode::InternalError);

        let app: AppError = status(503, "maintenance").into();
        assert_eq!(app.code, ErrorCode::NetworkError);
        assert_eq!(app.message, "Backend returned 503 Service Unavailable: maintenance");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = AccessError::NotFound("profile u-1".into()).into();
        assert_eq!(app.code, ErrorCode::NotFound);
        assert_eq!(app.message, "Not found: profile u-1");

        let original = AppError::validation("bad role");
        let app: AppError = AccessError::from(original).into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
        assert_eq!(app.message, "bad role");
    }
}
