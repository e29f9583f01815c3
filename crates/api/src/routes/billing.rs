//! Billing routes: Stripe webhook receiver and checkout creation

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use clinic_billing::{BillingError, BillingService, CheckoutResponse};
use serde_json::{json, Value};

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

fn billing(state: &AppState) -> Result<&BillingService, BillingError> {
    state
        .billing
        .as_deref()
        .ok_or_else(|| BillingError::Config("billing is disabled".to_string()))
}

/// POST /api/stripe/webhook
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let handler = billing(&state).and_then(BillingService::webhooks).map_err(|e| {
        tracing::error!(error = %e, "Stripe webhook received but webhooks are not configured");
        ApiError::Configuration
    })?;

    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Stripe webhook missing signature header");
            ApiError::BadRequest("No signature".to_string())
        })?;

    let envelope = handler.verify_event(&body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Stripe webhook rejected");
        ApiError::BadRequest("Invalid signature".to_string())
    })?;

    let event_id = envelope.id.clone();
    let outcome = handler.handle_event(envelope).await.map_err(|e| {
        tracing::error!(event_id = %event_id, error = %e, "Error processing webhook");
        ApiError::internal("Webhook processing failed")
    })?;

    tracing::debug!(event_id = %event_id, mutated = outcome.mutated(), "Stripe webhook handled");
    Ok(Json(json!({ "received": true })))
}

/// POST /api/billing/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<CheckoutResponse>> {
    let expose = state.config.expose_error_detail;

    let result = match billing(&state) {
        Ok(billing) => billing.create_checkout(&auth_user.id, &auth_user.email).await,
        Err(e) => Err(e),
    };

    let response = result.map_err(|e| {
        if e.is_config() {
            tracing::error!(user_id = %auth_user.id, error = %e, "Checkout requested but Stripe is not configured");
        }
        ApiError::from(e).with_detail_exposed(expose)
    })?;

    Ok(Json(response))
}
