//! Authentication middleware for Axum

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::sessions::SessionResolver;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions by [`require_session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// State needed for session authentication
#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionResolver>,
    pub cookie_prefix: String,
}

/// Session cookie value, plain or `__Secure-` variant. Empty values are ignored.
pub fn session_cookie<'a>(headers: &'a HeaderMap, prefix: &str) -> Option<&'a str> {
    let cookie_name = format!("{prefix}.session_token");
    let secure_cookie_name = format!("__Secure-{cookie_name}");

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| {
            let name = name.trim();
            (name == cookie_name || name == secure_cookie_name) && !value.is_empty()
        })
        .map(|(_, value)| value)
}

/// Token part of a signed cookie value (`<token>.<signature>`)
pub fn session_token(cookie_value: &str) -> &str {
    cookie_value
        .split_once('.')
        .map_or(cookie_value, |(token, _)| token)
}

/// Middleware that requires a live session
pub async fn require_session(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let Some(token) =
        session_cookie(request.headers(), &auth_state.cookie_prefix).map(session_token)
    else {
        tracing::debug!(path = %path, "require_session: no session cookie");
        return ApiError::Unauthorized.into_response();
    };

    let resolved = auth_state.sessions.resolve(token).await;
    match resolved {
        Ok(Some(auth_user)) => {
            tracing::debug!(path = %path, user_id = %auth_user.id, "require_session: authenticated");
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!(path = %path, "require_session: unknown or expired session");
            ApiError::Unauthorized.into_response()
        }
        Err(e) => {
            tracing::error!(path = %path, error = ?e, "require_session: session lookup failed");
            ApiError::Database(e).into_response()
        }
    }
}
