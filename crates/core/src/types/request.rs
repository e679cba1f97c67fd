//! Wire format of the backend discount-creation request.
//!
//! Field names follow the backend's camelCase JSON. Numeric fields are sent as
//! JSON numbers, not strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::discount::{CombinesWith, DiscountClass, DiscountKind};

/// Body of `POST /api/latest/discount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    /// Merchant-facing title.
    pub title: String,
    /// When the discount becomes active.
    pub starts_at: DateTime<Utc>,
    /// When the discount expires; omitted for open-ended discounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Discount function configuration.
    pub metafields: DiscountMetafields,
    /// Stacking rules.
    pub combines_with: CombinesWith,
}

/// Configuration stored alongside the discount for the discount function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountMetafields {
    /// Discount class; always `order` for this page.
    #[serde(rename = "type")]
    pub class: DiscountClass,
    pub discount_type: DiscountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    pub description: String,
    /// Minimum order subtotal.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_value: Decimal,
    /// Minimum item quantity.
    #[serde(with = "rust_decimal::serde::float")]
    pub min_qty: Decimal,
    pub one_per_user: bool,
    /// Product GIDs the discount is limited to (empty for order discounts).
    pub products: Vec<String>,
    /// Collection GIDs the discount is limited to (empty for order discounts).
    pub collections: Vec<String>,
    /// Uploaded banner, if one was attached and uploaded successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<BannerImage>,
    /// Offer text shown next to the banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_description: Option<String>,
}

/// A banner image registered as a Shopify file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerImage {
    /// File GID (e.g., `gid://shopify/MediaImage/123`).
    pub file_id: String,
    /// Staged resource URL the file was created from.
    pub url: String,
    /// Alt text.
    pub alt: String,
}
