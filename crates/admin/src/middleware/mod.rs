//! Request extractors for admin.
//!
//! - `launch` - Verifies the HMAC Shopify attaches when it opens the embedded app

pub mod launch;

pub use launch::{LAUNCH_MAX_AGE_SECS, ShopifyLaunch, launch_signature, verify_launch};
