//! Shopify embedded-app launch verification.
//!
//! When the admin opens the app it appends `shop`, `host`, `timestamp` and an
//! `hmac` to the URL. The `hmac` is HMAC-SHA256, keyed with the app's API
//! secret, over every other query parameter sorted by name and joined as
//! `key=value` pairs with `&`. A signed launch is only accepted while its
//! `timestamp` is within [`LAUNCH_MAX_AGE_SECS`] of the server clock.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use shpfy_core::ShopDomain;

use crate::error::AppError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters excluded from the signed message.
const UNSIGNED_PARAMS: [&str; 2] = ["hmac", "signature"];

/// How far a signed launch `timestamp` may be from now, in either direction.
pub const LAUNCH_MAX_AGE_SECS: i64 = 300;

/// A verified launch of the embedded app.
///
/// Rejects with 401 when the signature is missing (and signed launches are
/// required), invalid, stale, or issued for a different store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopifyLaunch {
    /// Store the app was opened from, when the launch carried one.
    pub shop: Option<ShopDomain>,
    /// Base64 host parameter used by App Bridge.
    pub host: Option<String>,
    /// Whether an HMAC was present and verified.
    pub signed: bool,
}

impl FromRequestParts<AppState> for ShopifyLaunch {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let config = state.config();
        let launch = verify_launch(
            parts.uri.query().unwrap_or(""),
            config.shopify.api_secret.expose_secret(),
            &config.shopify.store,
            config.require_signed_launch,
            Utc::now(),
        );

        if let Err(e) = &launch {
            tracing::warn!(error = %e, path = %parts.uri.path(), "Rejected app launch");
        }

        launch
    }
}

/// Verify a launch query string.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the signature is missing while
/// required or does not match, if the signed `timestamp` is missing or more
/// than [`LAUNCH_MAX_AGE_SECS`] away from `now`, or if the `shop` parameter
/// names another store.
pub fn verify_launch(
    query: &str,
    secret: &str,
    store: &ShopDomain,
    require_signed: bool,
    now: DateTime<Utc>,
) -> Result<ShopifyLaunch, AppError> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let param = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    let host = param("host");
    let shop = param("shop");

    let Some(provided) = param("hmac") else {
        if require_signed {
            return Err(AppError::Unauthorized(
                "Missing launch signature".to_string(),
            ));
        }
        return Ok(ShopifyLaunch {
            shop: shop.and_then(|s| ShopDomain::parse(&s).ok()),
            host,
            signed: false,
        });
    };

    let provided = hex::decode(provided)
        .map_err(|_| AppError::Unauthorized("Malformed launch signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(signed_message(&pairs).as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| AppError::Unauthorized("Invalid launch signature".to_string()))?;

    let issued_at = param("timestamp")
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing launch timestamp".to_string()))?;
    let age = now.timestamp().saturating_sub(issued_at);
    if age.unsigned_abs() > LAUNCH_MAX_AGE_SECS.unsigned_abs() {
        return Err(AppError::Unauthorized(format!(
            "Launch timestamp is {age}s from now"
        )));
    }

    let shop = shop
        .as_deref()
        .map(ShopDomain::parse)
        .transpose()
        .map_err(|e| AppError::Unauthorized(format!("Invalid shop parameter: {e}")))?
        .ok_or_else(|| AppError::Unauthorized("Missing shop parameter".to_string()))?;

    if &shop != store {
        return Err(AppError::Unauthorized(format!(
            "Launch is for {shop}, not {store}"
        )));
    }

    Ok(ShopifyLaunch {
        shop: Some(shop),
        host,
        signed: true,
    })
}

/// Hex HMAC Shopify would attach to a launch with these parameters.
#[must_use]
pub fn launch_signature<K, V>(pairs: &[(K, V)], secret: &str) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let owned: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();

    // HMAC accepts keys of any length
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(signed_message(&owned).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn signed_message(pairs: &[(String, String)]) -> String {
    let mut signed: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(key, _)| !UNSIGNED_PARAMS.contains(&key.as_str()))
        .collect();
    signed.sort();

    signed
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}
