//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                      - Health check
//!
//! # Order discount page (HTML + HTMX)
//! GET  /discounts/order/new                         - Page, opens a draft (signed launch)
//! POST /discounts/order/{draft}/title               - Title and description card
//! POST /discounts/order/{draft}/value               - Discount value card
//! POST /discounts/order/{draft}/usage-limit         - Usage limit checkbox
//! POST /discounts/order/{draft}/minimum             - Minimum requirement card
//! POST /discounts/order/{draft}/combinations        - Combinations card
//! POST /discounts/order/{draft}/active-dates        - Active dates card
//! POST /discounts/order/{draft}/banner              - Banner card (multipart)
//! POST /discounts/order/{draft}/submit              - Save
//!
//! # Draft API (JSON)
//! POST /api/discounts/order/drafts                  - Open a draft (signed launch)
//! GET  /api/discounts/order/drafts/{draft}          - Draft values + request preview
//! POST /api/discounts/order/drafts/{draft}/events   - Apply a form event
//! POST /api/discounts/order/drafts/{draft}/submit   - Submit
//! ```

pub mod api;
pub mod discounts;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the application router (without state).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/discounts/order", discounts::router())
        .merge(api::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
