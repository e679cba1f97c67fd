//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **CRITICAL: This module holds the high-privilege Shopify Admin API token.**
//!
//! The discount page only needs two mutations (`stagedUploadsCreate` and
//! `fileCreate`) plus an upload to the signed target Shopify hands back, but
//! the token itself grants full store access.
//!
//! # Architecture
//!
//! - Uses the `graphql_client` query trait for typed variables and responses
//! - Direct API calls to Shopify (no local storage)
//! - Rate limiting and auth failures surface as typed errors
//!
//! # Example
//!
//! ```rust,ignore
//! use shpfy_admin::shopify::AdminClient;
//!
//! let client = AdminClient::new(&config.shopify, config.http_timeout)?;
//! let file = client.upload_banner(&banner, "Spring sale banner").await?;
//! println!("{}", file.id);
//! ```

mod admin;
pub mod redirect;
pub mod types;

pub use admin::AdminClient;
pub use admin::queries;
pub use redirect::{AdminRedirect, AdminSection};
pub use types::{StagedUploadTarget, UploadedFile};

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// `stagedUploadsCreate` succeeded but returned no target.
    #[error("Staged upload returned no target")]
    MissingStagedTarget,

    /// The signed upload target rejected the file.
    #[error("Staged upload failed with status {status}: {body}")]
    StagedUpload {
        /// HTTP status returned by the upload target.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with only a message, for failures Shopify did not describe.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
