//! Response types for authority calls
//!
//! The authority speaks plain HTTP + JSON and reports failure two ways: a
//! non-2xx status with `{"detail": ...}`, or a 2xx status whose body carries
//! `{"error": ...}`. `ResponseResult::from_http` folds both into one shape so
//! callers never inspect status codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Response Result
// =============================================================================

/// Result of a request operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseResult {
    /// Operation succeeded
    Success {
        /// Optional data payload (varies by request type)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Operation failed
    Error {
        /// Error classification code
        code: ErrorCode,
        /// Machine-readable detail as sent by the authority
        message: String,
        /// Full error body (optional)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    /// Unknown response type for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ResponseResult {
    /// Create a success response with data
    pub fn success<T: Serialize>(data: T) -> Self {
        ResponseResult::Success {
            data: Some(serde_json::to_value(data).unwrap_or_default()),
        }
    }

    /// Create a success response without data
    pub fn success_empty() -> Self {
        ResponseResult::Success { data: None }
    }

    /// Create an error response
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ResponseResult::Error {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Check if this is a success response
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseResult::Success { .. })
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseResult::Error { .. })
    }

    /// Normalise an HTTP status and (possibly empty) JSON body.
    pub fn from_http(status: u16, body: Option<Value>) -> Self {
        let body = body.filter(|b| !b.is_null());

        if (200..300).contains(&status) {
            if let Some(error) = body.as_ref().and_then(|b| b.get("error")) {
                if !error.is_null() {
                    return ResponseResult::Error {
                        code: ErrorCode::Rejected,
                        message: detail_text(error),
                        details: body.clone(),
                    };
                }
            }
            return ResponseResult::Success { data: body };
        }

        let message = body
            .as_ref()
            .and_then(|b| b.get("detail"))
            .map(detail_text)
            .unwrap_or_else(|| format!("HTTP {}", status));
        ResponseResult::Error {
            code: ErrorCode::from_status(status),
            message,
            details: body,
        }
    }
}

/// Detail strings pass through; structured details are kept as compact JSON.
fn detail_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // === Client Errors (4xx) ===
    /// Request was malformed or invalid
    BadRequest,
    /// Credential missing or rejected
    Unauthorized,
    /// User lacks permission for this operation
    Forbidden,
    /// Requested resource not found
    NotFound,
    /// Operation conflicts with current state
    Conflict,
    /// Request data failed validation
    ValidationError,
    /// Rate limit exceeded
    RateLimitExceeded,
    /// Accepted at the HTTP level but refused by game rules (`{"error": ...}`)
    Rejected,

    // === Server Errors (5xx) ===
    /// Internal server error
    InternalError,
    /// Required service is unavailable
    ServiceUnavailable,
    /// Operation timed out
    Timeout,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            408 | 504 => ErrorCode::Timeout,
            409 => ErrorCode::Conflict,
            422 => ErrorCode::ValidationError,
            429 => ErrorCode::RateLimitExceeded,
            503 => ErrorCode::ServiceUnavailable,
            500..=599 => ErrorCode::InternalError,
            _ => ErrorCode::Unknown,
        }
    }
}

// =============================================================================
// Request Error (Client-Side)
// =============================================================================

/// Client-side request errors
///
/// These are errors that occur on the client side when making requests,
/// distinct from authority-side errors returned in `ResponseResult::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Request timed out waiting for response
    Timeout,
    /// Failed to reach the authority
    SendFailed(String),
    /// Authority answered with a body that is not JSON
    InvalidBody(String),
    /// Failed to build the request
    SerializationError(String),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Timeout => write!(f, "Request timed out"),
            RequestError::SendFailed(msg) => write!(f, "Failed to send request: {}", msg),
            RequestError::InvalidBody(msg) => write!(f, "Invalid response body: {}", msg),
            RequestError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_keeps_body() {
        let result = ResponseResult::from_http(200, Some(json!({ "gold": 5 })));
        assert_eq!(
            result,
            ResponseResult::Success {
                data: Some(json!({ "gold": 5 }))
            }
        );
    }

    #[test]
    fn null_body_is_empty_success() {
        assert_eq!(
            ResponseResult::from_http(200, Some(Value::Null)),
            ResponseResult::success_empty()
        );
    }

    #[test]
    fn error_in_2xx_body_is_an_error() {
        let result = ResponseResult::from_http(
            200,
            Some(json!({ "error": "dungeon_already_active" })),
        );
        match result {
            ResponseResult::Error { code, message, .. } => {
                assert_eq!(code, ErrorCode::Rejected);
                assert_eq!(message, "dungeon_already_active");
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn null_error_field_is_not_an_error() {
        let result = ResponseResult::from_http(200, Some(json!({ "error": null, "ok": true })));
        assert!(result.is_success());
    }

    #[test]
    fn non_2xx_reads_detail() {
        let result = ResponseResult::from_http(401, Some(json!({ "detail": "init data expired" })));
        assert_eq!(
            result,
            ResponseResult::Error {
                code: ErrorCode::Unauthorized,
                message: "init data expired".into(),
                details: Some(json!({ "detail": "init data expired" })),
            }
        );
    }

    #[test]
    fn non_2xx_without_body_names_status() {
        match ResponseResult::from_http(503, None) {
            ResponseResult::Error { code, message, .. } => {
                assert_eq!(code, ErrorCode::ServiceUnavailable);
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn structured_detail_is_stringified() {
        let result = ResponseResult::from_http(422, Some(json!({ "detail": [{ "loc": "slot" }] })));
        match result {
            ResponseResult::Error { message, .. } => assert!(message.contains("slot")),
            other => panic!("expected error, got {:?}", other),
        }
    }
}
