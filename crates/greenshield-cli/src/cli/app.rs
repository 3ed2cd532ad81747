//! Shell state shared by the session commands: config, session, gateway and
//! the router the navigation guard acts on.

use std::sync::Arc;

use anyhow::{Context, Result};
use greenshield_core::api::{ApiError, Gateway};
use greenshield_core::config::Config;
use greenshield_core::navigation::{GuardDecision, NavigationGuard, Route, Router, StackRouter};
use greenshield_core::session::SessionManager;
use greenshield_core::store::{FileTokenStore, TokenStore};
use tracing::debug;

pub struct App {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub gateway: Arc<Gateway>,
    router: StackRouter,
}

/// What happened when the shell tried to open a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Opened,
    /// The guard sent us elsewhere (e.g. to `Login` without a session).
    Redirected(Route),
}

impl App {
    /// Loads config and the persisted session, then settles the router.
    pub async fn start() -> Result<Self> {
        let config = Config::load().context("load config")?;
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::default_location());
        let session = Arc::new(SessionManager::new(store));
        let gateway = Arc::new(
            Gateway::from_config(&config, Arc::clone(&session)).context("create API client")?,
        );

        let mut router = StackRouter::new(Route::Index);
        session.load().await;
        router.mark_ready();
        NavigationGuard::apply(&session.snapshot(), &mut router);
        debug!(route = ?router.current(), "shell ready");

        Ok(Self {
            config,
            session,
            gateway,
            router,
        })
    }

    /// Navigates to `route` and reports where the guard left us.
    pub fn enter(&mut self, route: Route) -> Entry {
        match NavigationGuard::navigate(&self.session.snapshot(), &mut self.router, route) {
            GuardDecision::Redirect(target) => Entry::Redirected(target),
            GuardDecision::Loading | GuardDecision::Stay => Entry::Opened,
        }
    }

    /// Opens a protected screen, failing when there is no session.
    pub fn require_session(&mut self, route: Route) -> Result<()> {
        match self.enter(route) {
            Entry::Opened => Ok(()),
            Entry::Redirected(_) => {
                anyhow::bail!("Not signed in. Run `greenshield login` first.")
            }
        }
    }

    /// Re-applies the guard after a session change.
    pub fn settle(&mut self) {
        NavigationGuard::apply(&self.session.snapshot(), &mut self.router);
    }

    /// Converts an API failure, settling the router first if it expired the session.
    pub fn api_error(&mut self, err: ApiError) -> anyhow::Error {
        if err.is_session_expired() {
            self.settle();
        }
        err.into()
    }

    pub fn current_route(&self) -> Option<Route> {
        self.router.current()
    }
}
