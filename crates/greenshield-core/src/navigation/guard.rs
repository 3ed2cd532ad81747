//! Protected-navigation guard.
//!
//! The rule only acts once both the session has finished loading and the
//! router is ready; before that it reports [`GuardDecision::Loading`].
//!
//! | token   | partition | action                                  |
//! |---------|-----------|-----------------------------------------|
//! | None    | Protected | dismiss history, replace with `Login`   |
//! | Some(_) | Public    | dismiss history, replace with `(tabs)`  |
//! | other   |           | none                                    |

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use super::route::{Route, RoutePartition};
use super::router::Router;
use crate::session::Session;

/// Result of evaluating the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session or router not ready; show a neutral loading state.
    Loading,
    /// Current route already matches the session.
    Stay,
    /// Navigate to the given entry route, clearing history first.
    Redirect(Route),
}

/// Pure guard rule over `(is_loading, router ready, token, current route)`.
pub fn evaluate(session: &Session, router_ready: bool, current: Option<Route>) -> GuardDecision {
    if session.is_loading || !router_ready {
        return GuardDecision::Loading;
    }
    let Some(current) = current else {
        return GuardDecision::Stay;
    };

    match (session.is_authenticated(), current.partition()) {
        (false, RoutePartition::Protected) => GuardDecision::Redirect(Route::PUBLIC_ENTRY),
        (true, RoutePartition::Public) => GuardDecision::Redirect(Route::PROTECTED_ENTRY),
        _ => GuardDecision::Stay,
    }
}

/// Applies the guard rule to a router.
#[derive(Debug, Default, Clone, Copy)]
pub struct NavigationGuard;

impl NavigationGuard {
    /// Evaluates the rule and performs the redirect, if any.
    pub fn apply<R: Router + ?Sized>(session: &Session, router: &mut R) -> GuardDecision {
        let decision = evaluate(session, router.is_ready(), router.current());
        match decision {
            GuardDecision::Redirect(target) => {
                info!(
                    from = %router.current().map_or("-", Route::path),
                    to = %target,
                    authenticated = session.is_authenticated(),
                    "guard redirect"
                );
                router.dismiss_all();
                router.replace(target);
            }
            GuardDecision::Loading => debug!("guard waiting for session and router"),
            GuardDecision::Stay => {}
        }
        decision
    }

    /// Navigates to `route`, then re-evaluates the guard for the new location.
    pub fn navigate<R: Router + ?Sized>(
        session: &Session,
        router: &mut R,
        route: Route,
    ) -> GuardDecision {
        router.push(route);
        Self::apply(session, router)
    }
}

/// Re-applies the guard every time the session changes.
///
/// Runs until the session manager is dropped.
pub async fn watch_session<R>(mut session: watch::Receiver<Session>, router: Arc<Mutex<R>>)
where
    R: Router + Send,
{
    loop {
        let snapshot = session.borrow_and_update().clone();
        {
            let mut router = router.lock().await;
            NavigationGuard::apply(&snapshot, &mut *router);
        }
        if session.changed().await.is_err() {
            debug!("session closed; guard watcher exiting");
            return;
        }
    }
}
