//! Persisted token storage.
//!
//! Stores the session token in `<base>/session.json` under a single key, with
//! restricted permissions (0600). A missing file or key means "logged out".

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "userToken";

/// Durable storage for the single session token.
///
/// Implementations are blocking; the session manager moves calls off the
/// async context.
pub trait TokenStore: Send + Sync {
    /// Reads the stored token, `None` when absent.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn read(&self) -> Result<Option<String>>;

    /// Stores `token`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn write(&self, token: &str) -> Result<()>;

    /// Removes the stored token. Removing an absent token succeeds.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self) -> Result<()>;
}

/// On-disk key/value document.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

/// JSON-file token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `${GREENSHIELD_HOME}/session.json`.
    pub fn default_location() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    fn save(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(doc).context("Failed to serialize session")?;

        // Fresh tmp file so the mode applies even when the old file was wider.
        let tmp_path = self.path.with_extension("json.tmp");
        let _ = fs::remove_file(&tmp_path);
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp_path)
            .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Result<Option<String>> {
        let doc = self.load()?;
        Ok(doc
            .entries
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .cloned())
    }

    fn write(&self, token: &str) -> Result<()> {
        let mut doc = self.load()?;
        doc.entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save(&doc)
    }

    fn remove(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut doc = self.load()?;
        if doc.entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.save(&doc)
    }
}

/// In-memory token store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
