//! Application state

use std::sync::Arc;

use clinic_billing::{BillingService, PgSubscriptionStore, SubscriptionStore};
use sqlx::PgPool;

use crate::{
    auth::{AuthState, PgSessionResolver, SessionResolver},
    config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stripe billing; `None` when disabled via `ENABLE_BILLING=false`
    pub billing: Option<Arc<BillingService>>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let subscriptions: Arc<dyn SubscriptionStore> =
            Arc::new(PgSubscriptionStore::new(pool.clone()));
        let sessions: Arc<dyn SessionResolver> = Arc::new(PgSessionResolver::new(pool));

        let billing = if config.enable_billing {
            Some(Arc::new(BillingService::from_env(subscriptions.clone())))
        } else {
            tracing::info!("Billing disabled via config (ENABLE_BILLING=false)");
            None
        };

        Self {
            config,
            billing,
            subscriptions,
            sessions,
        }
    }

    /// Assemble state from prebuilt parts
    pub fn from_parts(
        config: Config,
        billing: Option<Arc<BillingService>>,
        subscriptions: Arc<dyn SubscriptionStore>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        Self {
            config,
            billing,
            subscriptions,
            sessions,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            sessions: self.sessions.clone(),
            cookie_prefix: self.config.session_cookie_prefix.clone(),
        }
    }
}
