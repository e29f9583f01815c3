//! API routes

pub mod billing;
pub mod subscription;


use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    auth::{require_session, route_guard},
    state::AppState,
};

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    let session_routes = Router::new()
        .route("/api/billing/checkout", post(billing::create_checkout))
        .route("/api/subscription", get(subscription::get_subscription))
        .route_layer(from_fn_with_state(auth_state.clone(), require_session));

    // Routes added after the guard layer are not guarded.
    Router::new()
        .route("/api/stripe/webhook", post(billing::stripe_webhook))
        .merge(session_routes)
        .layer(from_fn_with_state(auth_state, route_guard))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
