//! Subscription status for the signed-in user

use axum::{
    extract::{Extension, State},
    Json,
};
use clinic_shared::Plan;
use serde::Serialize;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct SubscriptionStatus {
    pub active: bool,
    pub plan: Option<Plan>,
    pub email: String,
}

/// GET /api/subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<SubscriptionStatus>> {
    let record = state
        .subscriptions
        .find(&auth_user.id)
        .await
        .map_err(ApiError::from)?;

    // A session without a user row reads as unsubscribed.
    let status = match record {
        Some(record) => SubscriptionStatus {
            active: record.is_active(),
            plan: record.plan,
            email: record.email,
        },
        None => SubscriptionStatus {
            active: false,
            plan: None,
            email: auth_user.email,
        },
    };

    Ok(Json(status))
}
