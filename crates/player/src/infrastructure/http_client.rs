//! HTTP adapter for the authority API
//!
//! Every request carries the player's credential header when one is
//! configured. Bodies are normalised through `ResponseResult::from_http`, so a
//! 200 answer with an `{"error": ...}` body still reaches callers as a refusal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use delver_shared::{AuthorityRequest, Method, RequestError, ResponseResult, Route};

use crate::application::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::ports::outbound::AuthorityPort;

/// Header the authority reads the player credential from.
pub const CREDENTIAL_HEADER: &str = "X-Telegram-Init-Data";

#[derive(Clone)]
pub struct HttpAuthority {
    client: Client,
    base_url: String,
    credential: Option<String>,
    default_timeout_ms: u64,
}

impl HttpAuthority {
    pub fn new(base_url: &str, credential: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: credential.filter(|c| !c.trim().is_empty()),
            default_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    /// Timeout applied by `request` when the caller does not pass one.
    pub fn with_default_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    async fn send(&self, route: Route, timeout: Duration) -> Result<ResponseResult, RequestError> {
        let url = build_url(&self.base_url, &route)?;
        tracing::debug!(method = ?route.method, %url, "Authority request");

        let mut builder = match route.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        }
        .timeout(timeout);

        if let Some(credential) = &self.credential {
            builder = builder.header(CREDENTIAL_HEADER, credential);
        }
        if let Some(body) = &route.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_transport)?;

        let body = parse_body(status, &text)?;
        if !(200..300).contains(&status) {
            tracing::debug!(status, path = %route.path, "Authority answered with an error status");
        }
        Ok(ResponseResult::from_http(status, body))
    }
}

#[async_trait]
impl AuthorityPort for HttpAuthority {
    async fn request(&self, request: AuthorityRequest) -> Result<ResponseResult, RequestError> {
        self.request_with_timeout(request, self.default_timeout_ms)
            .await
    }

    async fn request_with_timeout(
        &self,
        request: AuthorityRequest,
        timeout_ms: u64,
    ) -> Result<ResponseResult, RequestError> {
        self.send(request.route(), Duration::from_millis(timeout_ms))
            .await
    }
}

/// Join the API base with a route path and its query pairs.
pub fn build_url(base_url: &str, route: &Route) -> Result<Url, RequestError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), route.path);
    let mut url =
        Url::parse(&joined).map_err(|e| RequestError::SerializationError(e.to_string()))?;
    if !route.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &route.query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Empty bodies are `None`. A non-JSON body is only an error on success statuses;
/// error pages from proxies are reported through the status alone.
fn parse_body(status: u16, text: &str) -> Result<Option<Value>, RequestError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(Some(value)),
        Err(e) if (200..300).contains(&status) => Err(RequestError::InvalidBody(e.to_string())),
        Err(_) => Ok(None),
    }
}

fn map_transport(error: reqwest::Error) -> RequestError {
    if error.is_timeout() {
        RequestError::Timeout
    } else {
        RequestError::SendFailed(error.to_string())
    }
}
