//! Discount enums shared by the form page and the backend request.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How the discount value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// Fixed amount off the order.
    #[default]
    Amount,
    /// Percentage off the order.
    #[serde(alias = "percent")]
    Percentage,
}

/// Error returned when a discount kind string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown discount type: {0}")]
pub struct ParseDiscountKindError(pub String);

impl DiscountKind {
    /// Wire name, as sent in `metafields.discountType`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Percentage => "percentage",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount => write!(f, "Fixed amount"),
            Self::Percentage => write!(f, "Percentage"),
        }
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = ParseDiscountKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amount" | "fixed_amount" => Ok(Self::Amount),
            "percentage" | "percent" => Ok(Self::Percentage),
            other => Err(ParseDiscountKindError(other.to_string())),
        }
    }
}

/// Which part of the cart a discount targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountClass {
    /// Applies to the whole order.
    Order,
    /// Applies to individual products.
    Product,
    /// Applies to shipping.
    Shipping,
}

impl DiscountClass {
    /// Wire name, as sent in `metafields.type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Product => "product",
            Self::Shipping => "shipping",
        }
    }
}

/// Stacking rules for a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CombinesWith {
    /// Can combine with other order discounts.
    pub order_discounts: bool,
    /// Can combine with product discounts.
    pub product_discounts: bool,
    /// Can combine with shipping discounts.
    pub shipping_discounts: bool,
}

impl CombinesWith {
    /// Combination rules for an order-class discount.
    ///
    /// Order discounts never stack with other order or product discounts, so
    /// only the shipping flag is caller-controlled.
    #[must_use]
    pub const fn order_class(shipping_discounts: bool) -> Self {
        Self {
            order_discounts: false,
            product_discounts: false,
            shipping_discounts,
        }
    }
}
