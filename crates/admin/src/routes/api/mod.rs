//! API route handlers for admin.
//!
//! JSON endpoints mirroring the order discount page, for scripted clients.

pub mod discounts;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(discounts::router())
}
