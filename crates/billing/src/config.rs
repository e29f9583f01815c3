//! Stripe configuration
//!
//! Loaded once at startup. A component whose settings are incomplete is not
//! constructed, so handlers never re-check the environment per request.

use std::fmt;
use std::time::Duration;

use clinic_shared::env::non_empty;

use crate::error::{BillingError, BillingResult};

pub const STRIPE_SECRET_KEY: &str = "STRIPE_SECRET_KEY";
pub const STRIPE_WEBHOOK_SECRET: &str = "STRIPE_WEBHOOK_SECRET";
pub const STRIPE_ESSENTIAL_PLAN_PRICE_ID: &str = "STRIPE_ESSENTIAL_PLAN_PRICE_ID";
pub const APP_URL: &str = "NEXT_PUBLIC_APP_URL";
pub const STRIPE_WEBHOOK_TOLERANCE_SECS: &str = "STRIPE_WEBHOOK_TOLERANCE_SECS";

/// Stripe's own default for signed-timestamp age
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

/// Settings needed to open a hosted subscription checkout
#[derive(Clone)]
pub struct CheckoutConfig {
    pub secret_key: String,
    pub essential_price_id: String,
    pub app_url: String,
}

impl CheckoutConfig {
    pub fn from_env() -> BillingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BillingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = required(&lookup, STRIPE_SECRET_KEY)?;
        let essential_price_id = required(&lookup, STRIPE_ESSENTIAL_PLAN_PRICE_ID)?;
        let app_url = required(&lookup, APP_URL)?;

        Ok(Self {
            secret_key,
            essential_price_id,
            app_url: app_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn success_url(&self) -> String {
        format!("{}/dashboard?success=true", self.app_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/subscription?canceled=true", self.app_url)
    }
}

impl fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("secret_key", &"[redacted]")
            .field("essential_price_id", &self.essential_price_id)
            .field("app_url", &self.app_url)
            .finish()
    }
}

/// Settings needed to verify incoming Stripe events
#[derive(Clone)]
pub struct WebhookConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub tolerance: Duration,
}

impl WebhookConfig {
    pub fn from_env() -> BillingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BillingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = required(&lookup, STRIPE_SECRET_KEY)?;
        let webhook_secret = required(&lookup, STRIPE_WEBHOOK_SECRET)?;

        let tolerance = match non_empty(&lookup, STRIPE_WEBHOOK_TOLERANCE_SECS) {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                BillingError::Config(format!(
                    "{STRIPE_WEBHOOK_TOLERANCE_SECS} must be a whole number of seconds"
                ))
            })?,
            None => DEFAULT_WEBHOOK_TOLERANCE,
        };

        Ok(Self {
            secret_key,
            webhook_secret,
            tolerance,
        })
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret_key", &"[redacted]")
            .field("webhook_secret", &"[redacted]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

fn required<F>(lookup: &F, key: &str) -> BillingResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key).ok_or_else(|| BillingError::Config(format!("{key} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (STRIPE_SECRET_KEY, "sk_test_123"),
            (STRIPE_WEBHOOK_SECRET, "whsec_abc"),
            (STRIPE_ESSENTIAL_PLAN_PRICE_ID, "price_essential"),
            (APP_URL, "https://clinic.example.com/"),
        ]
    }

    #[test]
    fn test_checkout_config_builds_redirect_urls() {
        let config = CheckoutConfig::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(
            config.success_url(),
            "https://clinic.example.com/dashboard?success=true"
        );
        assert_eq!(
            config.cancel_url(),
            "https://clinic.example.com/subscription?canceled=true"
        );
    }

    #[test]
    fn test_checkout_config_requires_each_value() {
        for missing in [STRIPE_SECRET_KEY, STRIPE_ESSENTIAL_PLAN_PRICE_ID, APP_URL] {
            let env: Vec<_> = full_env()
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = CheckoutConfig::from_lookup(lookup_from(&env)).unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains(missing), "{err}");
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_env();
        env.retain(|(k, _)| *k != STRIPE_ESSENTIAL_PLAN_PRICE_ID);
        env.push((STRIPE_ESSENTIAL_PLAN_PRICE_ID, "   "));
        assert!(CheckoutConfig::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn test_webhook_config_ignores_checkout_settings() {
        let env = [
            (STRIPE_SECRET_KEY, "sk_test_123"),
            (STRIPE_WEBHOOK_SECRET, "whsec_abc"),
        ];
        let config = WebhookConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.tolerance, DEFAULT_WEBHOOK_TOLERANCE);
    }

    #[test]
    fn test_webhook_config_requires_signing_secret() {
        let env = [(STRIPE_SECRET_KEY, "sk_test_123")];
        let err = WebhookConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains(STRIPE_WEBHOOK_SECRET));
    }

    #[test]
    fn test_webhook_tolerance_override() {
        let mut env = full_env();
        env.push((STRIPE_WEBHOOK_TOLERANCE_SECS, "60"));
        let config = WebhookConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.tolerance, Duration::from_secs(60));

        let mut env = full_env();
        env.push((STRIPE_WEBHOOK_TOLERANCE_SECS, "soon"));
        assert!(WebhookConfig::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = WebhookConfig::from_lookup(lookup_from(&full_env())).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("whsec_abc"));
        assert!(!rendered.contains("sk_test_123"));
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(STRIPE_SECRET_KEY, "sk_env");
        std::env::set_var(STRIPE_WEBHOOK_SECRET, "whsec_env");
        std::env::remove_var(STRIPE_WEBHOOK_TOLERANCE_SECS);

        let config = WebhookConfig::from_env().unwrap();
        assert_eq!(config.webhook_secret, "whsec_env");

        std::env::remove_var(STRIPE_SECRET_KEY);
        std::env::remove_var(STRIPE_WEBHOOK_SECRET);
        assert!(WebhookConfig::from_env().is_err());
    }
}
