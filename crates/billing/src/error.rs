//! Billing error types

/// Errors raised by the billing crate
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Billing configuration error: {0}")]
    Config(String),

    #[error("Invalid webhook signature")]
    WebhookSignatureInvalid,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Provider detail is kept out of the message and only read through
    /// [`BillingError::detail`].
    #[error("Failed to create checkout session")]
    CheckoutFailed { detail: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl BillingError {
    /// Underlying provider detail, when the public message hides it
    pub fn detail(&self) -> Option<&str> {
        match self {
            BillingError::CheckoutFailed { detail } => Some(detail),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, BillingError::Config(_))
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Database(err.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
