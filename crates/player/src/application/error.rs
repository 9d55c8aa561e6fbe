//! Service layer error types
//!
//! This module defines errors that can occur in the application service layer,
//! abstracting over the HTTP transport.

use serde::de::DeserializeOwned;
use thiserror::Error;

use delver_domain::{DomainError, EntryRejection};
use delver_shared::{AuthorityFailure, ErrorCode, RequestError, ResponseResult};

use crate::application::store::StoreError;

/// Errors that can occur in service operations
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// Request failed to send or timed out
    Request(RequestError),
    /// Authority returned an error response
    ServerError { code: ErrorCode, message: String },
    /// Response was empty when data was expected
    EmptyResponse,
    /// Failed to parse response data
    ParseError(String),
    /// Response data or a local pre-check broke a domain rule
    Domain(DomainError),
    /// Snapshot store refused an update
    Store(StoreError),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Request(e) => write!(f, "Request error: {}", e),
            ServiceError::ServerError { code, message } => {
                write!(f, "Server error ({:?}): {}", code, message)
            }
            ServiceError::EmptyResponse => write!(f, "Server returned empty response"),
            ServiceError::ParseError(msg) => write!(f, "Failed to parse response: {}", msg),
            ServiceError::Domain(e) => write!(f, "Domain error: {}", e),
            ServiceError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<RequestError> for ServiceError {
    fn from(e: RequestError) -> Self {
        ServiceError::Request(e)
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        ServiceError::Domain(e)
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl ServiceError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::ServerError {
                code: ErrorCode::NotFound,
                ..
            }
        )
    }

    /// Check if this is an authorization error
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ServiceError::ServerError {
                code: ErrorCode::Unauthorized,
                ..
            }
        )
    }

    /// Game-rule refusal carried by an authority error, if this is one.
    pub fn failure(&self) -> Option<AuthorityFailure> {
        match self {
            ServiceError::ServerError { message, .. } => Some(AuthorityFailure::classify(message)),
            _ => None,
        }
    }
}

/// Helper trait for parsing ResponseResult into typed data
pub trait ParseResponse {
    /// Parse a ResponseResult into the expected type
    fn parse<T: DeserializeOwned>(self) -> Result<T, ServiceError>;

    /// Parse a ResponseResult that may return no data (for action calls)
    fn parse_empty(self) -> Result<(), ServiceError>;

    /// Parse a ResponseResult that may return Option<T> (`null` bodies and 404s)
    fn parse_optional<T: DeserializeOwned>(self) -> Result<Option<T>, ServiceError>;
}

impl ParseResponse for ResponseResult {
    fn parse<T: DeserializeOwned>(self) -> Result<T, ServiceError> {
        match self {
            ResponseResult::Success { data } => {
                let data = data.ok_or(ServiceError::EmptyResponse)?;
                serde_json::from_value(data).map_err(|e| ServiceError::ParseError(e.to_string()))
            }
            ResponseResult::Error { code, message, .. } => {
                Err(ServiceError::ServerError { code, message })
            }
            ResponseResult::Unknown => Err(ServiceError::ServerError {
                code: ErrorCode::InternalError,
                message: "Unknown response type".to_string(),
            }),
        }
    }

    fn parse_empty(self) -> Result<(), ServiceError> {
        match self {
            ResponseResult::Success { .. } => Ok(()),
            ResponseResult::Error { code, message, .. } => {
                Err(ServiceError::ServerError { code, message })
            }
            ResponseResult::Unknown => Err(ServiceError::ServerError {
                code: ErrorCode::InternalError,
                message: "Unknown response type".to_string(),
            }),
        }
    }

    fn parse_optional<T: DeserializeOwned>(self) -> Result<Option<T>, ServiceError> {
        match self {
            ResponseResult::Success { data: None } => Ok(None),
            ResponseResult::Success { data: Some(data) } => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| ServiceError::ParseError(e.to_string())),
            ResponseResult::Error {
                code: ErrorCode::NotFound,
                ..
            } => Ok(None),
            ResponseResult::Error { code, message, .. } => {
                Err(ServiceError::ServerError { code, message })
            }
            ResponseResult::Unknown => Err(ServiceError::ServerError {
                code: ErrorCode::InternalError,
                message: "Unknown response type".to_string(),
            }),
        }
    }
}

/// Default request timeout in milliseconds (2 minutes)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Get the request timeout from environment variable or use default
pub fn get_request_timeout_ms() -> u64 {
    std::env::var("DELVER_REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
}

/// Which combat action an in-flight guard protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    Start,
    Exit,
    Acknowledge,
}

/// Errors from `CombatSessionController` actions
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// The same action is already waiting on the authority
    #[error("{0:?} is already in progress")]
    Busy(CombatAction),
    /// Refused locally by the difficulty gate; the authority was not called
    #[error("{0}")]
    Rejected(EntryRejection),
    /// Refused by the authority for a game-rule reason
    #[error("{0}")]
    Authority(AuthorityFailure),
    /// Transport or parse failure; the session moved to `Error`
    #[error("{0}")]
    Service(ServiceError),
    /// The action is not valid in the current session state
    #[error("{0}")]
    InvalidTransition(DomainError),
}

impl ControllerError {
    /// User-facing advisory text.
    pub fn advisory(&self) -> String {
        match self {
            ControllerError::Authority(failure) => failure.advisory(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for ControllerError {
    fn from(e: DomainError) -> Self {
        ControllerError::InvalidTransition(e)
    }
}
