//! Navigation back into the Shopify admin.
//!
//! The page runs inside the Shopify admin iframe, so leaving it means
//! navigating the top-level window. HTMX requests get an `HX-Trigger`
//! event that the page script turns into `window.top.location`; plain form
//! posts get a `303 See Other`.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use shpfy_core::ShopDomain;

/// Name of the HTMX client event carrying the redirect URL.
pub const REDIRECT_EVENT: &str = "adminRedirect";

/// Sections of the Shopify admin this app sends merchants back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSection {
    /// The discount list.
    Discounts,
}

impl AdminSection {
    /// Path segment under the store admin.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Discounts => "discounts",
        }
    }
}

/// A redirect to a section of the host admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRedirect {
    url: String,
}

impl AdminRedirect {
    /// Redirect to `section` of `shop`'s admin.
    #[must_use]
    pub fn to_section(shop: &ShopDomain, section: AdminSection) -> Self {
        Self {
            url: format!(
                "https://admin.shopify.com/store/{}/{}",
                shop.handle(),
                section.path()
            ),
        }
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the response for a request, depending on whether HTMX sent it.
    #[must_use]
    pub fn respond(self, headers: &HeaderMap) -> Response {
        if is_htmx(headers) {
            let mut trigger = serde_json::Map::new();
            trigger.insert(
                REDIRECT_EVENT.to_string(),
                serde_json::json!({ "url": self.url }),
            );
            match HeaderValue::from_str(&serde_json::Value::Object(trigger).to_string()) {
                Ok(value) => (StatusCode::OK, [("HX-Trigger", value)]).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "Redirect URL is not a valid header value");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        } else {
            self.into_response()
        }
    }
}

impl IntoResponse for AdminRedirect {
    fn into_response(self) -> Response {
        match HeaderValue::from_str(&self.url) {
            Ok(location) => (StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Redirect URL is not a valid header value");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
