//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clinic_billing::BillingError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Server configuration error")]
    Configuration,

    /// 500 with a public message; `detail` is only rendered when exposed
    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: None,
        }
    }

    /// Drop provider detail unless the debug channel is on
    pub fn with_detail_exposed(self, expose: bool) -> Self {
        match self {
            ApiError::Internal { message, detail } if !expose && detail.is_some() => {
                ApiError::Internal {
                    message,
                    detail: None,
                }
            }
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration | ApiError::Internal { .. } | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Config(_) => ApiError::Configuration,
            BillingError::WebhookSignatureInvalid | BillingError::InvalidPayload(_) => {
                ApiError::BadRequest("Invalid signature".to_string())
            }
            BillingError::CheckoutFailed { detail } => ApiError::Internal {
                message: "Failed to create checkout session".to_string(),
                detail: Some(detail),
            },
            BillingError::Database(_) => ApiError::internal("Internal server error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Database(e) => {
                tracing::error!(error = ?e, "Database error");
                json!({ "error": self.to_string() })
            }
            ApiError::Internal {
                message,
                detail: Some(detail),
            } => json!({ "error": message, "detail": detail }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
