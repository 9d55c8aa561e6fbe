//! Authority Port - request/response calls to the game authority
//!
//! Uses the wire types from `delver-shared` directly: requests, the normalised
//! `ResponseResult` and the client-side `RequestError` are the contract between
//! the player client and the authority.
//!
//! Note: the async methods use `async_trait` instead of returning
//! `Pin<Box<dyn Future>>` for mockall compatibility.

use async_trait::async_trait;

use delver_shared::{AuthorityRequest, RequestError, ResponseResult};

/// Port for request-response operations against the authority
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthorityPort: Send + Sync {
    /// Send a request with the adapter's default timeout
    async fn request(&self, request: AuthorityRequest) -> Result<ResponseResult, RequestError>;

    /// Send a request with a custom timeout
    ///
    /// # Arguments
    /// * `request` - The request to send
    /// * `timeout_ms` - Timeout in milliseconds (default is from DELVER_REQUEST_TIMEOUT_MS or 120000)
    async fn request_with_timeout(
        &self,
        request: AuthorityRequest,
        timeout_ms: u64,
    ) -> Result<ResponseResult, RequestError>;
}
