//! Typed Stripe events
//!
//! Only the fields the receiver acts on are modelled, so payloads from newer
//! Stripe API versions (e.g. `invoice.parent.subscription_details`) parse
//! without depending on the SDK's generated types.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{BillingError, BillingResult};

/// Metadata key carrying our user id on sessions and subscriptions
pub const USER_ID_METADATA_KEY: &str = "userId";

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const INVOICE_PAID: &str = "invoice.paid";
pub const CUSTOMER_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Verified but not yet interpreted event
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

impl EventEnvelope {
    pub fn parse(payload: &[u8]) -> BillingResult<Self> {
        serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(parse_error = %e, "Failed to parse webhook event JSON");
            BillingError::InvalidPayload(e.to_string())
        })
    }

    /// Decode `data.object` according to `type`
    pub fn into_event(self) -> BillingResult<ProviderEvent> {
        let object = self.data.object;
        let kind = match self.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                EventKind::CheckoutSessionCompleted(decode_object(&self.event_type, object)?)
            }
            INVOICE_PAID => EventKind::InvoicePaid(decode_object(&self.event_type, object)?),
            CUSTOMER_SUBSCRIPTION_DELETED => {
                EventKind::CustomerSubscriptionDeleted(decode_object(&self.event_type, object)?)
            }
            _ => EventKind::Unhandled {
                event_type: self.event_type.clone(),
            },
        };

        Ok(ProviderEvent {
            id: self.id,
            created: self.created,
            kind,
        })
    }
}

fn decode_object<T>(event_type: &str, object: serde_json::Value) -> BillingResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(object).map_err(|e| {
        BillingError::InvalidPayload(format!("{event_type} object: {e}"))
    })
}

/// A Stripe event the receiver knows how to interpret
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEvent {
    pub id: String,
    pub created: i64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    CheckoutSessionCompleted(CheckoutSessionObject),
    InvoicePaid(InvoiceObject),
    CustomerSubscriptionDeleted(SubscriptionObject),
    Unhandled { event_type: String },
}

impl EventKind {
    pub fn event_type(&self) -> &str {
        match self {
            EventKind::CheckoutSessionCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            EventKind::InvoicePaid(_) => INVOICE_PAID,
            EventKind::CustomerSubscriptionDeleted(_) => CUSTOMER_SUBSCRIPTION_DELETED,
            EventKind::Unhandled { event_type } => event_type,
        }
    }
}

/// Either a bare id or an expanded object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObjectRef {
    Id(String),
    Object { id: String },
}

impl ObjectRef {
    pub fn id(&self) -> &str {
        match self {
            ObjectRef::Id(id) | ObjectRef::Object { id } => id,
        }
    }
}

type Metadata = HashMap<String, String>;

fn metadata_user_id(metadata: &Option<Metadata>) -> Option<&str> {
    metadata
        .as_ref()
        .and_then(|m| m.get(USER_ID_METADATA_KEY))
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}

fn ref_id(reference: &Option<ObjectRef>) -> Option<&str> {
    reference.as_ref().map(ObjectRef::id).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: Option<String>,
    pub customer: Option<ObjectRef>,
    pub metadata: Option<Metadata>,
}

impl CheckoutSessionObject {
    pub fn user_id(&self) -> Option<&str> {
        metadata_user_id(&self.metadata)
    }

    pub fn customer_id(&self) -> Option<&str> {
        ref_id(&self.customer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceObject {
    pub id: Option<String>,
    pub customer: Option<ObjectRef>,
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceParent {
    pub subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionDetails {
    pub metadata: Option<Metadata>,
    pub subscription: Option<ObjectRef>,
}

impl InvoiceObject {
    fn subscription_details(&self) -> Option<&SubscriptionDetails> {
        self.parent.as_ref()?.subscription_details.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.subscription_details()
            .and_then(|details| metadata_user_id(&details.metadata))
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_details()
            .and_then(|details| ref_id(&details.subscription))
    }

    pub fn customer_id(&self) -> Option<&str> {
        ref_id(&self.customer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionObject {
    pub id: Option<String>,
    pub metadata: Option<Metadata>,
}

impl SubscriptionObject {
    pub fn user_id(&self) -> Option<&str> {
        metadata_user_id(&self.metadata)
    }
}
