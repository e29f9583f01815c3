//! Authentication module for the clinic API

pub mod guard;
pub mod middleware;
#[cfg(test)]
mod middleware_tests;
pub mod sessions;

pub use guard::{guard_decision, is_guarded, route_guard, GuardDecision, SIGN_IN_PATH};
pub use middleware::{require_session, session_cookie, session_token, AuthState, AuthUser};
pub use sessions::{InMemorySessionResolver, PgSessionResolver, SessionResolver};
