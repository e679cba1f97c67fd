//! Banner image attached to a discount draft.

use std::fmt;

use axum::body::Bytes;

/// An image file picked in the banner card, held in memory until submit.
#[derive(Clone, PartialEq, Eq)]
pub struct BannerFile {
    /// Original filename from the browser.
    pub filename: String,
    /// MIME type reported by the browser (e.g., `image/png`).
    pub mime_type: String,
    /// File contents.
    pub bytes: Bytes,
}

impl BannerFile {
    /// Create a banner file.
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the browser labelled the file as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

// File contents are left out so drafts can be logged.
impl fmt::Debug for BannerFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BannerFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_omits_contents() {
        let banner = BannerFile::new("banner.png", "image/png", Bytes::from_static(b"PNGDATA"));
        let debug = format!("{banner:?}");
        assert!(debug.contains("banner.png"));
        assert!(debug.contains("size: 7"));
        assert!(!debug.contains("PNGDATA"));
    }

    #[test]
    fn test_is_image() {
        assert!(BannerFile::new("a.jpg", "image/jpeg", Bytes::new()).is_image());
        assert!(!BannerFile::new("a.pdf", "application/pdf", Bytes::new()).is_image());
    }
}
