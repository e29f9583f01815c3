// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Clinic Billing Module
//!
//! Handles the Stripe integration for the essential subscription plan.
//!
//! ## Features
//!
//! - **Checkout**: Open a hosted subscription checkout for the signed-in user
//! - **Webhooks**: Verify Stripe deliveries and keep the user's plan in sync
//! - **Store**: Postgres and in-memory persistence of subscription fields

pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod signature;
pub mod store;
pub mod webhooks;


// Checkout
pub use checkout::{CheckoutGateway, CheckoutResponse, CheckoutService, SubscriptionCheckout};

// Client
pub use client::StripeClient;

// Config
pub use config::{CheckoutConfig, WebhookConfig};

// Error
pub use error::{BillingError, BillingResult};

// Events
pub use events::{EventEnvelope, EventKind, ProviderEvent};

// Store
pub use store::{
    InMemorySubscriptionStore, PgSubscriptionStore, SubscriptionChange, SubscriptionStore,
};

// Webhooks
pub use webhooks::{WebhookHandler, WebhookOutcome};

use std::sync::Arc;

/// Main billing service that combines all billing functionality.
///
/// Checkout and webhook handling are configured independently: a missing
/// price id disables checkout without stopping webhook processing.
pub struct BillingService {
    checkout: Option<CheckoutService>,
    webhooks: Option<WebhookHandler>,
}

impl BillingService {
    /// Create a new billing service from environment variables
    pub fn from_env(store: Arc<dyn SubscriptionStore>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), store)
    }

    /// Create a billing service from an arbitrary settings source, talking to Stripe
    pub fn from_lookup<F>(lookup: F, store: Arc<dyn SubscriptionStore>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::assemble(&lookup, store, |config| -> Arc<dyn CheckoutGateway> {
            Arc::new(StripeClient::new(&config.secret_key))
        })
    }

    /// Create a billing service with an explicit checkout gateway
    pub fn with_gateway<F>(
        lookup: F,
        store: Arc<dyn SubscriptionStore>,
        gateway: Arc<dyn CheckoutGateway>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::assemble(&lookup, store, move |_| gateway)
    }

    fn assemble<F, G>(lookup: &F, store: Arc<dyn SubscriptionStore>, gateway: G) -> Self
    where
        F: Fn(&str) -> Option<String>,
        G: FnOnce(&CheckoutConfig) -> Arc<dyn CheckoutGateway>,
    {
        let checkout = match CheckoutConfig::from_lookup(lookup) {
            Ok(config) => {
                let gateway = gateway(&config);
                tracing::info!("Stripe checkout initialized");
                Some(CheckoutService::new(config, gateway))
            }
            Err(e) => {
                tracing::warn!("Stripe checkout not configured: {}", e);
                None
            }
        };

        let webhooks = match WebhookConfig::from_lookup(lookup) {
            Ok(config) => {
                tracing::info!("Stripe webhook handling initialized");
                Some(WebhookHandler::new(config, store))
            }
            Err(e) => {
                tracing::warn!("Stripe webhooks not configured: {}", e);
                None
            }
        };

        Self { checkout, webhooks }
    }

    pub fn checkout(&self) -> BillingResult<&CheckoutService> {
        self.checkout
            .as_ref()
            .ok_or_else(|| BillingError::Config("Stripe checkout is not configured".to_string()))
    }

    pub fn webhooks(&self) -> BillingResult<&WebhookHandler> {
        self.webhooks
            .as_ref()
            .ok_or_else(|| BillingError::Config("Stripe webhooks are not configured".to_string()))
    }

    /// Open a checkout for the caller; fails without contacting Stripe when unconfigured
    pub async fn create_checkout(
        &self,
        user_id: &str,
        email: &str,
    ) -> BillingResult<CheckoutResponse> {
        self.checkout()?.create_checkout(user_id, email).await
    }
}
