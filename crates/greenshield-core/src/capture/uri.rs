//! Platform-specific image URI normalization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// URI schemes that are passed through untouched.
const KNOWN_SCHEMES: &[&str] = &["file://", "content://"];

/// Host platform, as far as image URIs are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Camera and picker return bare paths that need a `file://` scheme.
    Android,
    Ios,
    Desktop,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    fn needs_file_scheme(self) -> bool {
        matches!(self, Platform::Android)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
            Platform::Desktop => write!(f, "desktop"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            "desktop" => Ok(Platform::Desktop),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

/// True when `uri` already carries one of the recognized schemes.
pub fn has_known_scheme(uri: &str) -> bool {
    KNOWN_SCHEMES.iter().any(|scheme| uri.starts_with(scheme))
}

/// Adds `file://` on platforms that hand out scheme-less paths.
///
/// Idempotent: a normalized URI is returned unchanged.
pub fn normalize_image_uri(uri: &str, platform: Platform) -> String {
    if platform.needs_file_scheme() && !has_known_scheme(uri) {
        format!("file://{uri}")
    } else {
        uri.to_string()
    }
}
