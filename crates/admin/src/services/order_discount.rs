//! Submitting an order discount.
//!
//! Submission uploads the banner (when one is attached), resolves the draft
//! into a [`DiscountRequest`] and posts it to the discount backend. A failed
//! banner upload does not block the discount; it is logged, reported to
//! Sentry and the discount is created without a banner.

use shpfy_core::{BannerImage, DiscountRequest};
use tracing::instrument;

use crate::models::FormState;
use crate::services::discount_api::{CreatedDiscount, DiscountApiClient, DiscountApiError};
use crate::shopify::{AdminClient, UploadedFile};

/// What happened to the banner during a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerUpload {
    /// No banner was attached.
    Skipped,
    /// The banner was uploaded and registered as a store file.
    Uploaded(UploadedFile),
    /// The upload failed; the discount was created without a banner.
    Failed(String),
}

impl BannerUpload {
    /// Short label for logs and API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Uploaded(_) => "uploaded",
            Self::Failed(_) => "failed",
        }
    }

    /// Banner reference to include in the request, if any.
    #[must_use]
    pub fn image(&self) -> Option<BannerImage> {
        match self {
            Self::Uploaded(file) => Some(BannerImage::from(file.clone())),
            Self::Skipped | Self::Failed(_) => None,
        }
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub banner: BannerUpload,
    /// Request that was sent to the backend.
    pub request: DiscountRequest,
    pub response: CreatedDiscount,
}

/// Upload the banner, if any, then create the discount.
///
/// # Errors
///
/// Returns `DiscountApiError` if the backend rejects the request or cannot be
/// reached. Banner failures never produce an error.
#[instrument(skip_all, fields(title = state.title.as_deref().unwrap_or("")))]
pub async fn submit(
    shopify: &AdminClient,
    discount_api: &DiscountApiClient,
    state: &FormState,
) -> Result<SubmitOutcome, DiscountApiError> {
    let banner = upload_banner(shopify, state).await;
    let request = state.resolve(banner.image());

    tracing::debug!(
        discount_type = %request.metafields.discount_type.as_str(),
        min_value = %request.metafields.min_value,
        min_qty = %request.metafields.min_qty,
        has_banner = request.metafields.banner_image.is_some(),
        "Posting discount"
    );

    let response = discount_api.create_discount(&request).await?;

    Ok(SubmitOutcome {
        banner,
        request,
        response,
    })
}

async fn upload_banner(shopify: &AdminClient, state: &FormState) -> BannerUpload {
    let Some(file) = &state.banner_file else {
        return BannerUpload::Skipped;
    };

    match shopify.upload_banner(file, &state.banner_alt_text()).await {
        Ok(uploaded) => BannerUpload::Uploaded(uploaded),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::warn!(
                error = %e,
                filename = %file.filename,
                sentry_event_id = %event_id,
                "Banner upload failed, creating discount without banner"
            );
            BannerUpload::Failed(e.to_string())
        }
    }
}
