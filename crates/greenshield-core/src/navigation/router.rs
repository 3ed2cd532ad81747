use tracing::debug;

use super::route::Route;

/// Navigation surface the guard drives.
pub trait Router {
    /// True once the router can accept navigation commands.
    fn is_ready(&self) -> bool;

    /// Route currently on screen.
    fn current(&self) -> Option<Route>;

    fn push(&mut self, route: Route);

    /// Replaces the top of the history with `route`.
    fn replace(&mut self, route: Route);

    /// Pops history back to its root entry.
    fn dismiss_all(&mut self);

    /// Pops one entry; returns false at the root.
    fn back(&mut self) -> bool;
}

/// In-memory router with a history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRouter {
    stack: Vec<Route>,
    ready: bool,
}

impl StackRouter {
    /// Router showing `initial`, not yet ready.
    pub fn new(initial: Route) -> Self {
        Self {
            stack: vec![initial],
            ready: false,
        }
    }

    /// Router showing `initial` that is already ready.
    pub fn ready(initial: Route) -> Self {
        Self {
            stack: vec![initial],
            ready: true,
        }
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// History, root first.
    pub fn history(&self) -> &[Route] {
        &self.stack
    }
}

impl Router for StackRouter {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn current(&self) -> Option<Route> {
        self.stack.last().copied()
    }

    fn push(&mut self, route: Route) {
        debug!(%route, "push");
        self.stack.push(route);
    }

    fn replace(&mut self, route: Route) {
        debug!(%route, "replace");
        match self.stack.last_mut() {
            Some(top) => *top = route,
            None => self.stack.push(route),
        }
    }

    fn dismiss_all(&mut self) {
        self.stack.truncate(1);
    }

    fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
