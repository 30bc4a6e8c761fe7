//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API error with HTTP status code
#[derive(Debug, Clone, Serialize, Error)]
pub struct ApiError {
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,

    /// Error message
    pub message: String,

    /// Error code for client handling
    pub code: &'static str,

    /// Endpoints the client may call instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<&'static str>>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            available: None,
        }
    }

    /// Attach the list of valid endpoints
    pub fn with_available(mut self, endpoints: &[&'static str]) -> Self {
        self.available = Some(endpoints.to_vec());
        self
    }

    /// 400 Bad Request for rejected input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "INVALID_INPUT")
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// 429 Too Many Requests
    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
            "RATE_LIMITED",
        )
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{:?}] [{}] {}", self.status, self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.message,
            "code": self.code,
        });
        if let Some(available) = self.available {
            body["available"] = serde_json::json!(available);
        }

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_invalid_input() {
        let error = ApiError::invalid_input("Input too short: min 2 characters");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "INVALID_INPUT");
    }

    #[test]
    fn test_api_error_not_found() {
        let error = ApiError::not_found("Endpoint not found").with_available(&["/", "/search"]);
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.available, Some(vec!["/", "/search"]));
    }

    #[test]
    fn test_api_error_rate_limited() {
        let error = ApiError::rate_limited();
        assert_eq!(error.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.code, "RATE_LIMITED");
    }

    #[test]
    fn test_api_error_internal() {
        let error = ApiError::internal("Something went wrong");
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_api_error_display() {
        let display = format!("{}", ApiError::not_found("test"));
        assert!(display.contains("NOT_FOUND"));
        assert!(display.contains("test"));
    }

    #[test]
    fn test_api_error_into_response() {
        let response = ApiError::invalid_input("test error").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
