//! Client for the discount backend.
//!
//! The backend owns discount creation on the store. This service only sends
//! it a fully resolved [`DiscountRequest`].
//!
//! # API Reference
//!
//! - Endpoint: `POST {DISCOUNT_API_URL}` (default `.../api/latest/discount`)
//! - Authentication: `Authorization: Bearer <DISCOUNT_API_TOKEN>`
//! - Body: JSON, camelCase

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use shpfy_core::DiscountRequest;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::DiscountApiConfig;
use crate::error::truncate_error_body;

/// Errors from the discount backend.
#[derive(Debug, Error)]
pub enum DiscountApiError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Discount API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Successful backend response.
#[derive(Debug, Clone)]
pub struct CreatedDiscount {
    /// HTTP status code.
    pub status: u16,
    /// Response body; JSON when the backend sent JSON, else a string.
    pub body: serde_json::Value,
}

/// Discount backend client.
#[derive(Clone)]
pub struct DiscountApiClient {
    inner: Arc<DiscountApiClientInner>,
}

struct DiscountApiClientInner {
    client: reqwest::Client,
    url: Url,
    token: SecretString,
}

impl DiscountApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DiscountApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &DiscountApiConfig, timeout: Duration) -> Result<Self, DiscountApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(DiscountApiClientInner {
                client,
                url: config.url.clone(),
                token: config.token.clone(),
            }),
        })
    }

    /// Endpoint discounts are posted to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Create a discount.
    ///
    /// # Errors
    ///
    /// Returns `DiscountApiError::Status` for a non-2xx response and
    /// `DiscountApiError::Http` if the request fails in transit.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_discount(
        &self,
        request: &DiscountRequest,
    ) -> Result<CreatedDiscount, DiscountApiError> {
        let response = self
            .inner
            .client
            .post(self.inner.url.clone())
            .bearer_auth(self.inner.token.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Discount API rejected request");
            return Err(DiscountApiError::Status {
                status: status.as_u16(),
                body: truncate_error_body(text),
            });
        }

        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        tracing::info!(status = status.as_u16(), response = %body, "Discount created");

        Ok(CreatedDiscount {
            status: status.as_u16(),
            body,
        })
    }
}
