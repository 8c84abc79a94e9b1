// src/error.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agents::generation::GenerationError;
use crate::sources::SourceError;

// ============================================================================
// Main Error Type
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    // Convenience constructors
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{} not found", resource.into()),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn agent(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AgentError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

// ============================================================================
// Error Codes
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    NotFound,
    ValidationError,

    // Server errors (5xx)
    Internal,
    AgentError,
    ExternalServiceError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::ValidationError => 400,
            Self::Internal => 500,
            Self::AgentError => 502,
            Self::ExternalServiceError => 502,
            Self::ServiceUnavailable => 503,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }

    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::AgentError => "AGENT_ERROR",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// Error Response for HTTP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: AppError) -> Self {
        Self {
            error: error.message,
            code: error.code,
            details: error.details,
            request_id: error.request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// ============================================================================
// Error Conversion Implementations
// ============================================================================

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        let mut details = serde_json::json!({ "source": err.kind().to_string() });
        if let Some(status) = err.upstream_status() {
            details["upstream_status"] = status.into();
        }
        Self::new(ErrorCode::ExternalServiceError, err.to_string()).with_details(details)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        Self::agent(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("IO error: {}", err))
    }
}

// ============================================================================
// Backend-specific HTTP Response Conversion
// ============================================================================

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        log_error(&self);

        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let response = ErrorResponse::new(self);

        (status, Json(response)).into_response()
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn log_error(error: &AppError) {
    if error.code.is_server_error() {
        log::error!("{}", error);
    } else {
        log::warn!("{}", error);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceKind;

    #[test]
    fn test_error_creation() {
        let err = AppError::not_found("Article");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("Article"));
    }

    #[test]
    fn test_error_with_details() {
        let err = AppError::validation("Invalid input")
            .with_details(serde_json::json!({"field": "query"}));
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ValidationError.http_status(), 400);
        assert_eq!(ErrorCode::AgentError.http_status(), 502);
        assert_eq!(ErrorCode::ExternalServiceError.http_status(), 502);
        assert_eq!(ErrorCode::ServiceUnavailable.http_status(), 503);
    }

    #[test]
    fn test_error_classification() {
        assert!(ErrorCode::ValidationError.is_client_error());
        assert!(ErrorCode::AgentError.is_server_error());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("Resource");
        let display = format!("{}", err);
        assert!(display.contains("NOT_FOUND"));
        assert!(display.contains("Resource"));
    }

    #[test]
    fn test_source_error_conversion() {
        let err: AppError = SourceError::Status {
            kind: SourceKind::OpenFda,
            status: 404,
            detail: "Not Found".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        let details = err.details.unwrap();
        assert_eq!(details["source"], "openFDA");
        assert_eq!(details["upstream_status"], 404);
    }

    #[test]
    fn test_envelope_serialization() {
        let response = ErrorResponse::new(AppError::validation("Query must not be empty"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Query must not be empty");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["timestamp"].is_string());
        assert!(json.get("request_id").is_none());

        let response = ErrorResponse::new(AppError::internal("boom").with_request_id("req-123"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["request_id"], "req-123");
    }
}
