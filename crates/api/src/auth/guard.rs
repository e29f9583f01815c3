//! Cookie route guard
//!
//! Runs in front of every route. Protected page paths without a session
//! cookie are redirected to the sign-in page; the cookie is only checked
//! for presence. Session validity is left to [`super::require_session`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::middleware::{session_cookie, AuthState};

pub const SIGN_IN_PATH: &str = "/authentication";

/// Always reachable, cookie or not
const PUBLIC_PREFIXES: &[&str] = &["/authentication", "/api/auth", "/api/stripe"];

const PROTECTED_PATHS: &[&str] = &[
    "/dashboard",
    "/patients",
    "/doctors",
    "/appointments",
    "/subscription",
    "/new-subscription",
];

/// Leading path text that takes a request out of the catch-all
const UNGUARDED_PREFIXES: &[&str] = &[
    "api",
    "_next/static",
    "_next/image",
    "favicon.ico",
    "sitemap.xml",
    "robots.txt",
    "authentication",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    RedirectToSignIn,
}

/// Whether the guard applies to `path` at all
pub fn is_guarded(path: &str) -> bool {
    if PROTECTED_PATHS.contains(&path) {
        return true;
    }
    match path.strip_prefix('/') {
        Some(rest) => !UNGUARDED_PREFIXES
            .iter()
            .any(|prefix| rest.starts_with(prefix)),
        None => false,
    }
}

pub fn guard_decision(path: &str, has_session_cookie: bool) -> GuardDecision {
    if !is_guarded(path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return GuardDecision::Pass;
    }
    if has_session_cookie {
        GuardDecision::Pass
    } else {
        GuardDecision::RedirectToSignIn
    }
}

pub async fn route_guard(
    State(auth_state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let has_cookie = session_cookie(request.headers(), &auth_state.cookie_prefix).is_some();

    match guard_decision(request.uri().path(), has_cookie) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::RedirectToSignIn => {
            tracing::debug!(path = %request.uri().path(), "route_guard: redirecting to sign-in");
            Redirect::temporary(SIGN_IN_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_pages_need_cookie() {
        for path in PROTECTED_PATHS {
            assert_eq!(guard_decision(path, false), GuardDecision::RedirectToSignIn, "{path}");
            assert_eq!(guard_decision(path, true), GuardDecision::Pass, "{path}");
        }
    }

    #[test]
    fn test_catch_all_covers_other_pages() {
        assert!(is_guarded("/"));
        assert!(is_guarded("/patients/42/history"));
        assert!(is_guarded("/settings"));
    }

    #[test]
    fn test_catch_all_exclusions() {
        for path in [
            "/api/billing/checkout",
            "/_next/static/chunk.js",
            "/_next/image",
            "/favicon.ico",
            "/sitemap.xml",
            "/robots.txt",
            "/authentication",
            "/authentication/sign-up",
        ] {
            assert!(!is_guarded(path), "{path}");
        }
    }

    #[test]
    fn test_exclusion_is_textual_prefix() {
        assert!(!is_guarded("/apiary"));
        assert!(is_guarded("/_next/data"));
    }

    #[test]
    fn test_stripe_and_auth_api_never_redirected() {
        assert_eq!(guard_decision("/api/stripe/webhook", false), GuardDecision::Pass);
        assert_eq!(guard_decision("/api/auth/sign-in", false), GuardDecision::Pass);
        assert_eq!(guard_decision("/authentication", false), GuardDecision::Pass);
    }
}
