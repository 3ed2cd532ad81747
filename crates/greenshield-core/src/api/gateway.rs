//! Authenticated request gateway.
//!
//! Every outbound call goes through [`Gateway::execute`], which attaches the
//! bearer token, sends the request, and maps the outcome to exactly one of
//! success or an [`ApiErrorKind`]. A 401 on a session-authenticated call
//! signs the session out before the error reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult, classify_reqwest_error};
use crate::config::Config;
use crate::session::SessionManager;

/// Standard User-Agent header for GreenShield requests.
pub const USER_AGENT: &str = concat!("greenshield/", env!("CARGO_PKG_VERSION"));

/// How a request is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// No `Authorization` header; a 401 is an ordinary request failure.
    Public,
    /// Token snapshot taken from the session when the call starts.
    Session,
    /// Explicit token snapshot (e.g. an upload request built earlier).
    Token(Option<String>),
}

/// Parsed, successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// The `data` member of the envelope (`Null` when absent).
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

/// Centralizes outbound HTTP calls and response classification.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl Gateway {
    /// Builds a gateway from configuration (base URL precedence and timeout).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be constructed.
    pub fn from_config(config: &Config, session: Arc<SessionManager>) -> Result<Self> {
        let base_url = config.resolve_base_url()?;
        Self::new(base_url, config.request_timeout(), session)
    }

    /// Builds a gateway for an explicit base URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        session: Arc<SessionManager>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Starts a request builder for `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends `request` and classifies the outcome.
    ///
    /// # Errors
    /// Returns exactly one [`ApiError`] kind per failed call.
    pub async fn execute(&self, request: RequestBuilder, auth: Auth) -> ApiResult<ApiResponse> {
        let authenticated = auth != Auth::Public;
        let token = match auth {
            Auth::Public => None,
            Auth::Session => self.session.token(),
            Auth::Token(token) => token,
        };

        let request = match token.as_deref() {
            Some(token) => match bearer_header(token) {
                Some(value) => request.header(AUTHORIZATION, value),
                None => {
                    warn!("stored token is not a valid header value; clearing session");
                    self.session.sign_out().await;
                    return Err(ApiError::session_expired());
                }
            },
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        let url = response.url().path().to_string();
        debug!(%url, status = status.as_u16(), "response received");

        if authenticated && status == StatusCode::UNAUTHORIZED {
            warn!(%url, "server rejected session token");
            self.session.sign_out().await;
            return Err(ApiError::session_expired());
        }

        let text = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        classify_response(status, &text)
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Builds the `Authorization` value. The lower-case scheme is what the
/// backend expects.
fn bearer_header(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("bearer {token}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// Maps a received status and body to success or a failure kind.
fn classify_response(status: StatusCode, text: &str) -> ApiResult<ApiResponse> {
    let code = status.as_u16();
    let body = match serde_json::from_str::<Value>(text) {
        Ok(body) if body.is_object() => body,
        _ => {
            warn!(status = code, "response body is not a JSON object");
            return Err(ApiError::server_format(code, text));
        }
    };

    let rejected = body.get("success").and_then(Value::as_bool) == Some(false);
    if !status.is_success() || rejected {
        let err = ApiError::request_failed(code, &body);
        debug!(status = code, message = %err.message, "request failed");
        return Err(err);
    }

    Ok(ApiResponse { status: code, body })
}
