//! Stripe API client

use std::collections::HashMap;

use async_trait::async_trait;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionPaymentMethodTypes,
    CreateCheckoutSessionSubscriptionData,
};

use crate::checkout::{CheckoutGateway, SubscriptionCheckout};
use crate::events::USER_ID_METADATA_KEY;

/// Thin wrapper around the async-stripe client
#[derive(Clone)]
pub struct StripeClient {
    inner: Client,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self {
            inner: Client::new(secret_key),
        }
    }
}

/// Subscription-mode session for one essential-plan seat.
///
/// Both the session and the resulting subscription carry the user id, so
/// every later event can be correlated back to the user row.
fn checkout_params(request: &SubscriptionCheckout) -> CreateCheckoutSession<'_> {
    let metadata: HashMap<String, String> =
        [(USER_ID_METADATA_KEY.to_string(), request.user_id.clone())].into();

    let mut params = CreateCheckoutSession::new();
    params.mode = Some(CheckoutSessionMode::Subscription);
    params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
    params.success_url = Some(&request.success_url);
    params.cancel_url = Some(&request.cancel_url);
    params.customer_email = Some(&request.customer_email);
    params.metadata = Some(metadata.clone());
    params.subscription_data = Some(CreateCheckoutSessionSubscriptionData {
        metadata: Some(metadata),
        ..Default::default()
    });
    params.line_items = Some(vec![CreateCheckoutSessionLineItems {
        price: Some(request.price_id.clone()),
        quantity: Some(1),
        ..Default::default()
    }]);
    params
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_subscription_session(
        &self,
        request: &SubscriptionCheckout,
    ) -> anyhow::Result<String> {
        let params = checkout_params(request);
        let session = CheckoutSession::create(&self.inner, params).await?;
        Ok(session.id.to_string())
    }
}
