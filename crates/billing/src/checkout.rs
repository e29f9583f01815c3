//! Hosted subscription checkout

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::CheckoutConfig;
use crate::error::{BillingError, BillingResult};

/// Parameters for one subscription-mode checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCheckout {
    pub user_id: String,
    pub customer_email: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Provider side of checkout creation
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Create the hosted session and return its id
    async fn create_subscription_session(
        &self,
        request: &SubscriptionCheckout,
    ) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
}

pub struct CheckoutService {
    config: CheckoutConfig,
    gateway: Arc<dyn CheckoutGateway>,
}

impl CheckoutService {
    pub fn new(config: CheckoutConfig, gateway: Arc<dyn CheckoutGateway>) -> Self {
        Self { config, gateway }
    }

    /// Open a checkout for the essential plan on behalf of `user_id`.
    ///
    /// Provider failures surface as [`BillingError::CheckoutFailed`]; the
    /// provider's message is logged and kept in the error's detail.
    pub async fn create_checkout(
        &self,
        user_id: &str,
        email: &str,
    ) -> BillingResult<CheckoutResponse> {
        tracing::info!(user_id = %user_id, email = %email, "Starting checkout");

        let request = SubscriptionCheckout {
            user_id: user_id.to_string(),
            customer_email: email.to_string(),
            price_id: self.config.essential_price_id.clone(),
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
        };

        match self.gateway.create_subscription_session(&request).await {
            Ok(session_id) => {
                tracing::info!(
                    user_id = %user_id,
                    session_id = %session_id,
                    "Checkout session created"
                );
                Ok(CheckoutResponse { session_id })
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Error creating checkout session");
                Err(BillingError::CheckoutFailed {
                    detail: e.to_string(),
                })
            }
        }
    }
}
