//! Navigation: route partitions, the router abstraction, and the guard that
//! keeps the current route consistent with the session.

mod guard;
mod route;
mod router;

pub use guard::{GuardDecision, NavigationGuard, evaluate, watch_session};
pub use route::{Route, RoutePartition, Tab};
pub use router::{Router, StackRouter};
