//! Stripe webhook handling
//!
//! Verifies signed deliveries and maps the three subscription lifecycle
//! events onto the user's subscription fields. Every branch is idempotent:
//! replaying a delivery leaves the row in the same state.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::WebhookConfig;
use crate::error::BillingResult;
use crate::events::{EventEnvelope, EventKind, ProviderEvent};
use crate::signature::verify_signature;
use crate::store::{SubscriptionChange, SubscriptionStore};

/// What a verified delivery did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied {
        user_id: String,
        change: SubscriptionChange,
    },
    /// The row did not exist; nothing was written
    UserNotFound { user_id: String },
    /// Known event type lacking the fields needed to act
    Skipped { reason: &'static str },
    Unhandled { event_type: String },
}

impl WebhookOutcome {
    pub fn mutated(&self) -> bool {
        matches!(self, WebhookOutcome::Applied { .. })
    }
}

/// Decision for one event, before touching the store
#[derive(Debug, PartialEq, Eq)]
enum Action<'a> {
    Apply {
        user_id: &'a str,
        change: SubscriptionChange,
    },
    Skip(&'static str),
    Ignore(&'a str),
}

fn action_for(kind: &EventKind) -> Action<'_> {
    match kind {
        EventKind::CheckoutSessionCompleted(session) => {
            match (session.user_id(), session.customer_id()) {
                (Some(user_id), Some(customer_id)) => Action::Apply {
                    user_id,
                    change: SubscriptionChange::CheckoutCompleted {
                        customer_id: customer_id.to_string(),
                    },
                },
                (None, _) => Action::Skip("checkout session has no userId metadata"),
                (Some(_), None) => Action::Skip("checkout session has no customer"),
            }
        }
        EventKind::InvoicePaid(invoice) => match invoice.user_id() {
            Some(user_id) => Action::Apply {
                user_id,
                change: SubscriptionChange::InvoicePaid {
                    customer_id: invoice.customer_id().map(str::to_string),
                    subscription_id: invoice.subscription_id().map(str::to_string),
                },
            },
            None => Action::Skip("invoice has no subscription userId metadata"),
        },
        EventKind::CustomerSubscriptionDeleted(subscription) => match subscription.user_id() {
            Some(user_id) => Action::Apply {
                user_id,
                change: SubscriptionChange::SubscriptionDeleted,
            },
            None => Action::Skip("subscription has no userId metadata"),
        },
        EventKind::Unhandled { event_type } => Action::Ignore(event_type),
    }
}

/// Webhook handler for Stripe events
pub struct WebhookHandler {
    config: WebhookConfig,
    store: Arc<dyn SubscriptionStore>,
}

impl fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebhookHandler {
    pub fn new(config: WebhookConfig, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { config, store }
    }

    /// Verify the signature and parse the event envelope
    pub fn verify_event(&self, payload: &[u8], signature: &str) -> BillingResult<EventEnvelope> {
        self.verify_event_at(payload, signature, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn verify_event_at(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> BillingResult<EventEnvelope> {
        verify_signature(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.tolerance,
            now,
        )?;
        EventEnvelope::parse(payload)
    }

    /// Handle a verified Stripe event
    pub async fn handle_event(&self, envelope: EventEnvelope) -> BillingResult<WebhookOutcome> {
        tracing::info!(
            event_type = %envelope.event_type,
            event_id = %envelope.id,
            created = envelope.created,
            "Processing Stripe webhook event"
        );

        let event = envelope.into_event()?;
        self.dispatch(&event).await
    }

    async fn dispatch(&self, event: &ProviderEvent) -> BillingResult<WebhookOutcome> {
        let event_type = event.kind.event_type();

        match action_for(&event.kind) {
            Action::Apply { user_id, change } => {
                let matched = self.store.apply(user_id, &change).await?;
                if !matched {
                    tracing::warn!(
                        event_id = %event.id,
                        event_type = %event_type,
                        user_id = %user_id,
                        "No user row for webhook event"
                    );
                    return Ok(WebhookOutcome::UserNotFound {
                        user_id: user_id.to_string(),
                    });
                }

                tracing::info!(
                    event_id = %event.id,
                    event_type = %event_type,
                    user_id = %user_id,
                    created = event.created,
                    change = change.name(),
                    "Updated user subscription"
                );
                Ok(WebhookOutcome::Applied {
                    user_id: user_id.to_string(),
                    change,
                })
            }
            Action::Skip(reason) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event_type,
                    reason = reason,
                    "Webhook event skipped"
                );
                Ok(WebhookOutcome::Skipped { reason })
            }
            Action::Ignore(event_type) => {
                tracing::info!(
                    event_type = %event_type,
                    event_id = %event.id,
                    "Received unhandled Stripe event type - no handler configured"
                );
                Ok(WebhookOutcome::Unhandled {
                    event_type: event_type.to_string(),
                })
            }
        }
    }
}
