//! Configuration management for GreenShield.
//!
//! Loads configuration from ${GREENSHIELD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::Platform;

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "GREENSHIELD_BASE_URL";

pub mod paths {
    //! Path resolution for GreenShield configuration and session data.
    //!
    //! GREENSHIELD_HOME resolution order:
    //! 1. GREENSHIELD_HOME environment variable (if set)
    //! 2. ~/.config/greenshield (default)

    use std::path::PathBuf;

    /// Returns the GreenShield home directory.
    pub fn greenshield_home() -> PathBuf {
        if let Ok(home) = std::env::var("GREENSHIELD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".greenshield"),
            |h| h.join(".config").join("greenshield"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        greenshield_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        greenshield_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL (without the `/api` suffix)
    pub base_url: String,
    /// Per-request timeout; 0 means no client-side timeout
    pub request_timeout_secs: u64,
    /// Number of predictions requested by history views
    pub history_limit: u32,
    /// Platform used for image URI normalization
    pub platform: Platform,
}

impl Config {
    pub const DEFAULT_BASE_URL: &'static str = "https://greenshield.up.railway.app";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_HISTORY_LIMIT: u32 = 1000;

    /// Loads configuration from the default path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default template to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Resolves the base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the selected URL is not a valid absolute URL.
    pub fn resolve_base_url(&self) -> Result<String> {
        let env_value = std::env::var(BASE_URL_ENV).ok();
        resolve_base_url(env_value.as_deref(), Some(&self.base_url))
    }

    /// Request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            platform: Platform::default(),
        }
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

fn resolve_base_url(env_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
    let chosen = [env_url, config_url]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(Config::DEFAULT_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid GreenShield base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}
