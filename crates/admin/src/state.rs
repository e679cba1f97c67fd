//! Application state shared across handlers.

use std::sync::Arc;

use crate::{
    config::AdminConfig,
    error::AppError,
    services::{DiscountApiClient, DraftStore},
    shopify::AdminClient,
};

/// Application state shared across all handlers.
///
/// Cheap to clone; all clones share one inner value.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    shopify: AdminClient,
    discount_api: DiscountApiClient,
    drafts: DraftStore,
}

impl AppState {
    /// Build state from configuration, creating the outbound clients.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, AppError> {
        let shopify = AdminClient::new(&config.shopify, config.http_timeout)?;
        let discount_api = DiscountApiClient::new(&config.discount_api, config.http_timeout)?;
        let drafts = DraftStore::new(config.draft_ttl, config.draft_max_bytes);

        Ok(Self::from_parts(config, shopify, discount_api, drafts))
    }

    /// Build state from already constructed parts.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        shopify: AdminClient,
        discount_api: DiscountApiClient,
        drafts: DraftStore,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                discount_api,
                drafts,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn discount_api(&self) -> &DiscountApiClient {
        &self.inner.discount_api
    }

    #[must_use]
    pub fn drafts(&self) -> &DraftStore {
        &self.inner.drafts
    }
}
