//! Business logic services for the discount admin.
//!
//! # Services
//!
//! - `discount_api` - Client for the discount backend
//! - `drafts` - In-memory store of open form drafts
//! - `order_discount` - Banner upload plus discount creation on submit

pub mod discount_api;
pub mod drafts;
pub mod order_discount;

pub use discount_api::{CreatedDiscount, DiscountApiClient, DiscountApiError};
pub use drafts::DraftStore;
pub use order_discount::{BannerUpload, SubmitOutcome, submit};
