//! Subscription persistence
//!
//! Every change is one `UPDATE ... WHERE id = $1`. Concurrent deliveries for
//! the same user race at the database with last-write-wins semantics.

use std::collections::HashMap;

use async_trait::async_trait;
use clinic_shared::{Plan, UserSubscription};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::error::BillingResult;

/// Mutation applied to a user's subscription fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// plan = essential, customer set, subscription untouched
    CheckoutCompleted { customer_id: String },
    /// plan = essential, subscription set (or cleared), customer set when known
    InvoicePaid {
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    /// plan, customer and subscription all cleared
    SubscriptionDeleted,
}

impl SubscriptionChange {
    pub fn apply_to(&self, record: &mut UserSubscription) {
        match self {
            SubscriptionChange::CheckoutCompleted { customer_id } => {
                record.plan = Some(Plan::Essential);
                record.stripe_customer_id = Some(customer_id.clone());
            }
            SubscriptionChange::InvoicePaid {
                customer_id,
                subscription_id,
            } => {
                record.plan = Some(Plan::Essential);
                record.stripe_subscription_id = subscription_id.clone();
                if let Some(customer_id) = customer_id {
                    record.stripe_customer_id = Some(customer_id.clone());
                }
            }
            SubscriptionChange::SubscriptionDeleted => {
                record.plan = None;
                record.stripe_customer_id = None;
                record.stripe_subscription_id = None;
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionChange::CheckoutCompleted { .. } => "checkout_completed",
            SubscriptionChange::InvoicePaid { .. } => "invoice_paid",
            SubscriptionChange::SubscriptionDeleted => "subscription_deleted",
        }
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Apply `change` to the user row. Returns `false` when no row matched.
    async fn apply(&self, user_id: &str, change: &SubscriptionChange) -> BillingResult<bool>;

    async fn find(&self, user_id: &str) -> BillingResult<Option<UserSubscription>>;
}

#[derive(Debug, FromRow)]
struct UserSubscriptionRow {
    id: String,
    email: String,
    plan: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
}

impl From<UserSubscriptionRow> for UserSubscription {
    fn from(row: UserSubscriptionRow) -> Self {
        let plan = row.plan.as_deref().and_then(|raw| match raw.parse::<Plan>() {
            Ok(plan) => Some(plan),
            Err(e) => {
                tracing::warn!(user_id = %row.id, error = %e, "Ignoring unknown plan on user row");
                None
            }
        });

        UserSubscription {
            id: row.id,
            email: row.email,
            plan,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
        }
    }
}

/// Postgres-backed store over the `users` table
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn apply(&self, user_id: &str, change: &SubscriptionChange) -> BillingResult<bool> {
        let result = match change {
            SubscriptionChange::CheckoutCompleted { customer_id } => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET plan = $2, stripe_customer_id = $3
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .bind(Plan::Essential.as_str())
                .bind(customer_id)
                .execute(&self.pool)
                .await?
            }
            SubscriptionChange::InvoicePaid {
                customer_id,
                subscription_id,
            } => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET plan = $2,
                        stripe_subscription_id = $3,
                        stripe_customer_id = COALESCE($4, stripe_customer_id)
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .bind(Plan::Essential.as_str())
                .bind(subscription_id.as_deref())
                .bind(customer_id.as_deref())
                .execute(&self.pool)
                .await?
            }
            SubscriptionChange::SubscriptionDeleted => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET plan = NULL, stripe_customer_id = NULL, stripe_subscription_id = NULL
                    WHERE id = $1
                    "#,
                )
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, user_id: &str) -> BillingResult<Option<UserSubscription>> {
        let row: Option<UserSubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, email, plan, stripe_customer_id, stripe_subscription_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserSubscription::from))
    }
}

/// Process-local store for development and tests
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    users: RwLock<HashMap<String, UserSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserSubscription>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn apply(&self, user_id: &str, change: &SubscriptionChange) -> BillingResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(record) => {
                change.apply_to(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(&self, user_id: &str) -> BillingResult<Option<UserSubscription>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}
