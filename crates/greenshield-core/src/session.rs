//! Session manager.
//!
//! Owns the in-memory view of the persisted token and is the only writer of
//! the [`TokenStore`]. Subscribers (navigation guard, screens) observe every
//! mutation through a `watch` channel.
//!
//! ## Lifecycle
//!
//! ```text
//! new()      -> { token: None, is_loading: true }
//! load()     -> { token: <stored>, is_loading: false }   (once)
//! sign_in()  -> store.write, then token = Some
//! sign_out() -> store.remove, then token = None          (no-op when None)
//! ```
//!
//! `sign_in` and `sign_out` are serialized so their storage effects never
//! interleave; when they race, the last one to run wins.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::logging::mask_token;
use crate::store::TokenStore;

/// Snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub is_loading: bool,
}

impl Session {
    fn initial() -> Self {
        Self {
            token: None,
            is_loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Process-wide session state container.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    state: watch::Sender<Session>,
    effects: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(Session::initial());
        Self {
            store,
            state,
            effects: Mutex::new(()),
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Reads the persisted token once at startup.
    ///
    /// Storage failures are logged and treated as "no token". Later calls are
    /// no-ops, so `is_loading` flips to false exactly once.
    pub async fn load(&self) {
        let _effects = self.effects.lock().await;
        if !self.state.borrow().is_loading {
            debug!("session already loaded");
            return;
        }

        let stored = match self.with_store(|store| store.read()).await {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to load session token: {err:#}");
                None
            }
        };

        match &stored {
            Some(token) => info!(token = %mask_token(token), "restored session"),
            None => debug!("no stored session"),
        }

        self.state.send_modify(|session| {
            if stored.is_some() {
                session.token = stored;
            }
            session.is_loading = false;
        });
    }

    /// Persists `token`, then marks the session authenticated.
    ///
    /// # Errors
    /// Returns an error if the token is empty or cannot be persisted; the
    /// in-memory session is left unchanged in that case.
    pub async fn sign_in(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            anyhow::bail!("Cannot sign in with an empty token");
        }

        let _effects = self.effects.lock().await;
        let to_store = token.clone();
        self.with_store(move |store| store.write(&to_store))
            .await
            .context("Failed to persist session token")?;

        info!(token = %mask_token(&token), "signed in");
        self.state.send_modify(|session| session.token = Some(token));
        Ok(())
    }

    /// Clears the session.
    ///
    /// Returns `false` without touching storage when already signed out. A
    /// storage failure is logged and the in-memory token is still cleared.
    pub async fn sign_out(&self) -> bool {
        let _effects = self.effects.lock().await;
        if self.state.borrow().token.is_none() {
            debug!("sign_out ignored: no active session");
            return false;
        }

        if let Err(err) = self.with_store(|store| store.remove()).await {
            warn!("Failed to remove persisted session token: {err:#}");
        }

        info!("signed out");
        self.state.send_if_modified(|session| session.token.take().is_some())
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn TokenStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .context("token store task failed")?
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.state.borrow();
        f.debug_struct("SessionManager")
            .field("authenticated", &session.token.is_some())
            .field("is_loading", &session.is_loading)
            .finish_non_exhaustive()
    }
}
