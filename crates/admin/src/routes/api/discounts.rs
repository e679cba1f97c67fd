//! Order discount draft API.
//!
//! Same draft lifecycle as the HTML page, driven with JSON [`FormEvent`]s.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use shpfy_core::{DiscountRequest, DraftId};
use tracing::instrument;

use crate::{
    error::AppError,
    middleware::ShopifyLaunch,
    models::{FormEvent, FormSnapshot},
    services,
    shopify::{AdminRedirect, AdminSection},
    state::AppState,
};

/// Build the discount draft router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/discounts/order/drafts", post(create_draft))
        .route("/api/discounts/order/drafts/{draft}", get(get_draft))
        .route(
            "/api/discounts/order/drafts/{draft}/events",
            post(apply_event),
        )
        .route(
            "/api/discounts/order/drafts/{draft}/submit",
            post(submit_draft),
        )
}

/// A draft and its current values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub draft_id: DraftId,
    pub state: FormSnapshot,
}

/// A draft plus the request a submit would send (without a banner).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPreviewResponse {
    pub draft_id: DraftId,
    pub state: FormSnapshot,
    pub request: DiscountRequest,
}

/// Result of a successful submit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: &'static str,
    pub redirect_url: String,
    pub banner: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_error: Option<String>,
    pub response: serde_json::Value,
}

/// Open a new draft. Requires a verified launch, like the HTML page.
#[instrument(skip(state, launch), fields(signed = launch.signed))]
pub async fn create_draft(
    launch: ShopifyLaunch,
    State(state): State<AppState>,
) -> (StatusCode, Json<DraftResponse>) {
    let (draft_id, form) = state.drafts().create().await;

    (
        StatusCode::CREATED,
        Json(DraftResponse {
            draft_id,
            state: FormSnapshot::from(&form),
        }),
    )
}

/// Current values of a draft and a preview of the resolved request.
///
/// # Errors
///
/// Returns 404 if the draft does not exist or has expired.
#[instrument(skip(state))]
pub async fn get_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> Result<Json<DraftPreviewResponse>, AppError> {
    let form = state
        .drafts()
        .get(draft_id)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    Ok(Json(DraftPreviewResponse {
        draft_id,
        state: FormSnapshot::from(&form),
        request: form.resolve(None),
    }))
}

/// Apply one change event.
///
/// # Errors
///
/// Returns 404 if the draft does not exist; malformed events are rejected
/// by the JSON extractor.
#[instrument(skip(state, event), fields(event = event.name()))]
pub async fn apply_event(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Json(event): Json<FormEvent>,
) -> Result<Json<DraftResponse>, AppError> {
    let form = state
        .drafts()
        .apply(draft_id, event)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    Ok(Json(DraftResponse {
        draft_id,
        state: FormSnapshot::from(&form),
    }))
}

/// Submit a draft.
///
/// # Errors
///
/// Returns 404 for an unknown draft or one already being submitted, and 502
/// if the discount backend fails; the draft is put back on failure.
#[instrument(skip(state))]
pub async fn submit_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = state
        .drafts()
        .take(draft_id)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    let outcome = match services::submit(state.shopify(), state.discount_api(), &form).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.drafts().restore(draft_id, form).await;
            return Err(e.into());
        }
    };

    let redirect =
        AdminRedirect::to_section(&state.config().shopify.store, AdminSection::Discounts);
    let banner_error = match &outcome.banner {
        services::BannerUpload::Failed(message) => Some(message.clone()),
        _ => None,
    };

    Ok(Json(SubmitResponse {
        status: "success",
        redirect_url: redirect.url().to_string(),
        banner: outcome.banner.as_str(),
        banner_error,
        response: outcome.response.body,
    }))
}
