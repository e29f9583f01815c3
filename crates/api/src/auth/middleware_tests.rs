//! Unit tests for authentication middleware
//!
//! Tests cover:
//! - Session cookie extraction (plain and `__Secure-` names, custom prefix)
//! - `require_session` with live, expired and missing sessions
//! - `route_guard` redirects

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::Extension,
        http::{header, HeaderMap, HeaderValue, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    use super::super::guard::route_guard;
    use super::super::middleware::*;
    use super::super::sessions::InMemorySessionResolver;

    fn cookies(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(value));
        headers
    }

    fn doctor() -> AuthUser {
        AuthUser {
            id: "user_1".to_string(),
            email: "doc@clinic.test".to_string(),
        }
    }

    async fn auth_state() -> AuthState {
        let sessions = InMemorySessionResolver::new();
        sessions
            .insert("live", doctor(), OffsetDateTime::now_utc() + Duration::hours(1))
            .await;
        sessions
            .insert("stale", doctor(), OffsetDateTime::now_utc() - Duration::hours(1))
            .await;
        AuthState {
            sessions: Arc::new(sessions),
            cookie_prefix: "better-auth".to_string(),
        }
    }

    async fn whoami(Extension(user): Extension<AuthUser>) -> String {
        user.email
    }

    async fn protected_app() -> Router {
        let state = auth_state().await;
        Router::new()
            .route("/me", get(whoami))
            .layer(from_fn_with_state(state, require_session))
    }

    async fn guarded_app() -> Router {
        let state = auth_state().await;
        Router::new()
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/api/stripe/webhook", get(|| async { "webhook" }))
            .layer(from_fn_with_state(state, route_guard))
    }

    // =========================================================================
    // Cookie extraction
    // =========================================================================

    #[test]
    fn test_plain_cookie_found_among_others() {
        let headers = cookies("theme=dark; better-auth.session_token=abc.sig; lang=pt");
        assert_eq!(session_cookie(&headers, "better-auth"), Some("abc.sig"));
    }

    #[test]
    fn test_secure_cookie_name_accepted() {
        let headers = cookies("__Secure-better-auth.session_token=xyz");
        assert_eq!(session_cookie(&headers, "better-auth"), Some("xyz"));
    }

    #[test]
    fn test_custom_prefix() {
        let headers = cookies("clinic.session_token=abc");
        assert_eq!(session_cookie(&headers, "clinic"), Some("abc"));
        assert_eq!(session_cookie(&headers, "better-auth"), None);
    }

    #[test]
    fn test_empty_cookie_value_ignored() {
        let headers = cookies("better-auth.session_token=");
        assert_eq!(session_cookie(&headers, "better-auth"), None);
    }

    #[test]
    fn test_token_is_part_before_signature() {
        assert_eq!(session_token("tok123.c2lnbmF0dXJl"), "tok123");
        assert_eq!(session_token("unsigned"), "unsigned");
    }

    // =========================================================================
    // require_session
    // =========================================================================

    #[tokio::test]
    async fn test_live_session_reaches_handler() {
        let response = protected_app()
            .await
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, "better-auth.session_token=live.signature")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"doc@clinic.test");
    }

    #[tokio::test]
    async fn test_expired_session_unauthorized() {
        let response = protected_app()
            .await
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, "better-auth.session_token=stale.signature")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_cookie_unauthorized_with_json_error() {
        let response = protected_app()
            .await
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Authentication required" }));
    }

    // =========================================================================
    // route_guard
    // =========================================================================

    #[tokio::test]
    async fn test_guard_redirects_without_cookie() {
        let response = guarded_app()
            .await
            .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/authentication"
        );
    }

    #[tokio::test]
    async fn test_guard_checks_presence_only() {
        // Not a known session, but the guard does not look it up.
        let response = guarded_app()
            .await
            .oneshot(
                Request::get("/dashboard")
                    .header(header::COOKIE, "better-auth.session_token=anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_guard_lets_webhook_through() {
        let response = guarded_app()
            .await
            .oneshot(
                Request::get("/api/stripe/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
