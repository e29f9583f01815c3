//! User subscription record
//!
//! The billing-relevant slice of a user row. Users are created by the auth
//! service; only the webhook receiver changes these fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription tier attached to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Essential,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Essential => "essential",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct PlanParseError(pub String);

impl FromStr for Plan {
    type Err = PlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "essential" => Ok(Plan::Essential),
            other => Err(PlanParseError(other.to_string())),
        }
    }
}

/// Subscription fields of a user row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: String,
    pub email: String,
    pub plan: Option<Plan>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
}

impl UserSubscription {
    /// A freshly registered user: no plan, no Stripe references
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            plan: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.plan == Some(Plan::Essential)
    }
}
