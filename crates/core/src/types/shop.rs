//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The domain is not under `myshopify.com`.
    #[error("shop domain must end with {suffix}")]
    WrongSuffix {
        /// Required suffix.
        suffix: &'static str,
    },
    /// The store handle (before the suffix) is empty.
    #[error("shop handle cannot be empty")]
    EmptyHandle,
    /// The store handle contains a character Shopify does not allow.
    #[error("shop handle contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A `*.myshopify.com` shop domain.
///
/// ## Constraints
///
/// - Case-insensitive, stored lowercase
/// - Must end with `.myshopify.com`
/// - Handle must be non-empty and only contain `a-z`, `0-9` and `-`
///
/// ## Examples
///
/// ```
/// use shpfy_core::ShopDomain;
///
/// let shop = ShopDomain::parse("Acme-Store.myshopify.com").unwrap();
/// assert_eq!(shop.as_str(), "acme-store.myshopify.com");
/// assert_eq!(shop.handle(), "acme-store");
///
/// assert!(ShopDomain::parse("acme.example.com").is_err());
/// assert!(ShopDomain::parse(".myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Domain suffix every Shopify store shares.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not a `myshopify.com`
    /// domain, or the handle contains characters other than `a-z0-9-`.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let lower = s.trim().to_lowercase();
        if lower.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let handle = lower
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::WrongSuffix {
                suffix: Self::SUFFIX,
            })?;

        if handle.is_empty() {
            return Err(ShopDomainError::EmptyHandle);
        }

        if let Some(bad) = handle
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(ShopDomainError::InvalidCharacter(bad));
        }

        Ok(Self(lower))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
