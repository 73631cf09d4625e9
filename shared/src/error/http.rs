//! HTTP status mapping for backend responses

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Map an HTTP status returned by the backend onto an error code
    pub fn from_http_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::NotAuthenticated,
            StatusCode::FORBIDDEN => Self::PermissionDenied,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::CONFLICT => Self::AlreadyExists,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::ValidationFailed,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::TimeoutError,
            // Transient, the caller may retry
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => Self::NetworkError,
            s if s.is_success() => Self::Success,
            _ => Self::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::UNAUTHORIZED),
            ErrorCode::NotAuthenticated
        );
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::NOT_FOUND),
            ErrorCode::NotFound
        );
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::CONFLICT),
            ErrorCode::AlreadyExists
        );
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::GATEWAY_TIMEOUT),
            ErrorCode::TimeoutError
        );
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::NO_CONTENT),
            ErrorCode::Success
        );
        assert_eq!(
            ErrorCode::from_http_status(StatusCode::INTERNAL_SERVER_ERROR),
            ErrorCode::InternalError
        );
    }
}
