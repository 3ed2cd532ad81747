//! Request failure taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message shown when the server rejects the session token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again.";

/// Fallback when an error response carries no message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Maximum number of body characters kept in a format error.
const BODY_EXCERPT_CHARS: usize = 100;

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// No response reached the client (connect failure, timeout, I/O)
    Network,
    /// Response body was not the expected JSON envelope
    ServerFormat,
    /// Well-formed error response other than 401
    RequestFailed,
    /// Server answered 401; the session has been cleared
    SessionExpired,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::ServerFormat => write!(f, "server_format"),
            ApiErrorKind::RequestFailed => write!(f, "request_failed"),
            ApiErrorKind::SessionExpired => write!(f, "session_expired"),
        }
    }
}

/// Structured request error with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status when a response was received
    pub status: Option<u16>,
    /// Diagnostic details (transport error, body excerpt)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Creates a network error from a transport failure description.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates a format error keeping the status and a truncated body excerpt.
    pub fn server_format(status: u16, body: &str) -> Self {
        let excerpt = body_excerpt(body);
        Self {
            kind: ApiErrorKind::ServerFormat,
            message: format!("Server Error ({status}): {excerpt}"),
            status: Some(status),
            details: (!excerpt.is_empty()).then_some(excerpt),
        }
    }

    /// Creates a format error for a parsed body with an unexpected shape.
    pub fn unexpected_shape(status: u16, what: impl fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::ServerFormat,
            message: format!("Server Error ({status}): {what}"),
            status: Some(status),
            details: None,
        }
    }

    /// Creates a request failure from a parsed error body.
    pub fn request_failed(status: u16, body: &Value) -> Self {
        let message = server_message(body).unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        Self {
            kind: ApiErrorKind::RequestFailed,
            message,
            status: Some(status),
            details: None,
        }
    }

    pub fn session_expired() -> Self {
        Self {
            kind: ApiErrorKind::SessionExpired,
            message: SESSION_EXPIRED_MESSAGE.to_string(),
            status: Some(401),
            details: None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ApiErrorKind::SessionExpired
    }

    pub(crate) fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for gateway operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Classifies a transport-level failure (no usable response).
pub fn classify_reqwest_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::network("Request timed out").with_details(e.to_string())
    } else if e.is_connect() {
        ApiError::network("Could not connect to server").with_details(e.to_string())
    } else {
        ApiError::network(format!("Network error: {e}"))
    }
}

/// Extracts the most specific human-readable message from an error body.
///
/// Looks at `message`, then `error.message` / `error`, then a serialized
/// `errors` field.
fn server_message(body: &Value) -> Option<String> {
    let non_empty = |v: &Value| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    if let Some(msg) = body.get("message").and_then(non_empty) {
        return Some(msg);
    }
    if let Some(error) = body.get("error") {
        if let Some(msg) = error.get("message").and_then(non_empty) {
            return Some(msg);
        }
        if let Some(msg) = non_empty(error) {
            return Some(msg);
        }
    }
    body.get("errors")
        .filter(|errors| !errors.is_null())
        .map(Value::to_string)
}

fn body_excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}
