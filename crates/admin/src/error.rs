//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shpfy_core::DraftId;
use thiserror::Error;

use crate::models::FieldError;
use crate::services::DiscountApiError;
use crate::shopify::AdminShopifyError;

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    /// Discount backend call failed.
    #[error("Discount API error: {0}")]
    DiscountApi(#[from] DiscountApiError),

    /// Draft does not exist or has expired.
    #[error("Draft not found: {0}")]
    DraftNotFound(DraftId),

    /// Launch request is missing a valid Shopify signature.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Internal(_) | Self::Shopify(_) | Self::DiscountApi(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(_) | Self::DiscountApi(_) => StatusCode::BAD_GATEWAY,
            Self::DraftNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(_) | Self::DiscountApi(_) => "External service error".to_string(),
            Self::DraftNotFound(_) => {
                "This discount draft has expired. Reload the page to start again.".to_string()
            }
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Longest upstream response body kept in an error.
const MAX_ERROR_BODY_LEN: usize = 1024;

/// Cut an upstream error body to [`MAX_ERROR_BODY_LEN`] bytes on a char
/// boundary.
pub(crate) fn truncate_error_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_LEN {
        let cut = (0..=MAX_ERROR_BODY_LEN)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    body
}
