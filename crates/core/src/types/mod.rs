//! Core types for Shpfy discounts.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod id;
pub mod request;
pub mod shop;

pub use discount::{CombinesWith, DiscountClass, DiscountKind, ParseDiscountKindError};
pub use id::DraftId;
pub use request::{BannerImage, DiscountMetafields, DiscountRequest};
pub use shop::{ShopDomain, ShopDomainError};
