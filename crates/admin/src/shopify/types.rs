//! Domain types returned by the Shopify Admin client.

use serde::{Deserialize, Serialize};

/// Staged upload target for file uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedUploadTarget {
    /// The URL to upload the file to.
    pub url: String,
    /// The resource URL after upload completes.
    pub resource_url: String,
    /// Form parameters to include with the upload, in order.
    pub parameters: Vec<(String, String)>,
}

/// A file registered with `fileCreate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File GID (e.g., `gid://shopify/MediaImage/123`).
    pub id: String,
    /// Staged resource URL the file was created from.
    pub resource_url: String,
    /// Alt text stored on the file.
    pub alt: String,
    /// Processing status reported by Shopify (e.g., `UPLOADED`).
    pub status: String,
}

impl From<UploadedFile> for shpfy_core::BannerImage {
    fn from(file: UploadedFile) -> Self {
        Self {
            file_id: file.id,
            url: file.resource_url,
            alt: file.alt,
        }
    }
}
