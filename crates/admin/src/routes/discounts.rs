//! Order discount create page.
//!
//! The page is opened from the Shopify admin and runs inside its iframe.
//! Each card on the page posts its own fields over HTMX and gets the summary
//! card back; Save submits the whole draft.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shpfy_core::{DiscountKind, DraftId};
use tracing::instrument;

use crate::{
    error::AppError,
    middleware::ShopifyLaunch,
    models::{
        BannerFile, FormEvent, FormState, MinimumRequirement, parse_datetime_field,
        parse_decimal_field,
    },
    services::{self, DiscountApiError},
    shopify::{AdminRedirect, AdminSection},
    state::AppState,
};

/// Largest banner upload accepted, in bytes.
pub const MAX_BANNER_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Value format of `<input type="datetime-local">`.
const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

// =============================================================================
// Views
// =============================================================================

/// Field values for the form inputs.
#[derive(Debug, Clone)]
pub struct FormView {
    pub title: String,
    pub description: String,
    pub is_percentage: bool,
    pub discount_value: String,
    pub minimum: &'static str,
    pub min_value: String,
    pub min_qty: String,
    pub one_per_user: bool,
    pub shipping_discounts: bool,
    pub starts_at: String,
    pub ends_at: String,
    pub offer_description: String,
    pub banner_name: Option<String>,
}

impl From<&FormState> for FormView {
    fn from(state: &FormState) -> Self {
        Self {
            title: state.title.clone().unwrap_or_default(),
            description: state.description.clone().unwrap_or_default(),
            is_percentage: state.discount_type == DiscountKind::Percentage,
            discount_value: state.discount_value.normalize().to_string(),
            minimum: state.minimum_requirement().as_str(),
            min_value: input_amount(state.min_value),
            min_qty: input_amount(state.min_qty),
            one_per_user: state.one_per_user,
            shipping_discounts: state.combines_with.shipping_discounts,
            starts_at: state.starts_at.format(DATETIME_LOCAL_FORMAT).to_string(),
            ends_at: state
                .ends_at
                .map(|end| end.format(DATETIME_LOCAL_FORMAT).to_string())
                .unwrap_or_default(),
            offer_description: state.offer_description.clone(),
            banner_name: state.banner_file.as_ref().map(|f| f.filename.clone()),
        }
    }
}

/// Zeroed minimums are mode-switch placeholders, not merchant input.
fn input_amount(value: Option<Decimal>) -> String {
    value
        .filter(|v| !v.is_zero())
        .map(|v| v.normalize().to_string())
        .unwrap_or_default()
}

/// Summary card contents.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub title: String,
    pub lines: Vec<String>,
}

impl From<&FormState> for SummaryView {
    fn from(state: &FormState) -> Self {
        let title = state
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| "No title yet".to_string(), str::to_string);

        let value = match state.discount_type {
            DiscountKind::Percentage => {
                format!("{}% off entire order", state.discount_value.normalize())
            }
            DiscountKind::Amount => format!("${:.2} off entire order", state.discount_value),
        };

        let minimum = match state.minimum_requirement() {
            MinimumRequirement::None => "No minimum purchase requirement".to_string(),
            MinimumRequirement::Subtotal => state.min_value.filter(|v| !v.is_zero()).map_or_else(
                || "Minimum purchase amount not set".to_string(),
                |v| format!("Minimum purchase of ${v:.2}"),
            ),
            MinimumRequirement::Quantity => state.min_qty.filter(|v| !v.is_zero()).map_or_else(
                || "Minimum quantity not set".to_string(),
                |v| format!("Minimum purchase of {} items", v.normalize()),
            ),
        };

        let usage = if state.one_per_user {
            "One use per customer"
        } else {
            "Unlimited uses per customer"
        };

        let combinations = if state.combines_with.shipping_discounts {
            "Combines with shipping discounts"
        } else {
            "Can't combine with other discounts"
        };

        let mut active = format!("Active from {}", state.starts_at.format("%b %-d, %Y"));
        if let Some(end) = state.ends_at {
            active.push_str(&format!(" until {}", end.format("%b %-d, %Y")));
        }

        let mut lines = vec![
            value,
            minimum,
            usage.to_string(),
            combinations.to_string(),
            active,
        ];
        if let Some(file) = &state.banner_file {
            lines.push(format!("Banner: {}", file.filename));
        }

        Self { title, lines }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Order discount create page.
#[derive(Template, WebTemplate)]
#[template(path = "discounts/order_new.html")]
pub struct OrderDiscountPageTemplate {
    pub draft_id: String,
    pub form: FormView,
    pub summary: SummaryView,
}

/// Summary card (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "discounts/_summary.html")]
pub struct DiscountSummaryTemplate {
    pub summary: SummaryView,
}

impl From<&FormState> for DiscountSummaryTemplate {
    fn from(state: &FormState) -> Self {
        Self {
            summary: SummaryView::from(state),
        }
    }
}

/// Submit failure notice (HTMX fragment).
#[derive(Template, WebTemplate)]
#[template(path = "discounts/_submit_error.html")]
pub struct SubmitErrorTemplate {
    pub message: String,
}

// =============================================================================
// Form inputs
// =============================================================================

/// Title and description card.
#[derive(Debug, Deserialize)]
pub struct TitleForm {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Discount value card.
#[derive(Debug, Deserialize)]
pub struct ValueForm {
    pub discount_type: Option<String>,
    pub value: Option<String>,
}

/// Usage limit checkbox; absent when unchecked.
#[derive(Debug, Deserialize)]
pub struct UsageLimitForm {
    pub once_per_customer: Option<String>,
}

/// Minimum requirement card.
#[derive(Debug, Deserialize)]
pub struct MinimumForm {
    pub requirement: String,
    pub min_value: Option<String>,
    pub min_qty: Option<String>,
}

/// Combinations card; absent when unchecked.
#[derive(Debug, Deserialize)]
pub struct CombinationsForm {
    pub shipping_discounts: Option<String>,
}

/// Active dates card.
#[derive(Debug, Deserialize)]
pub struct ActiveDatesForm {
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

impl TryFrom<ValueForm> for FormEvent {
    type Error = AppError;

    fn try_from(form: ValueForm) -> Result<Self, Self::Error> {
        let discount_type = form
            .discount_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<DiscountKind>)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(Self::Value {
            discount_type,
            value: parse_decimal_field("value", form.value.as_deref())?,
        })
    }
}

impl TryFrom<MinimumForm> for FormEvent {
    type Error = AppError;

    fn try_from(form: MinimumForm) -> Result<Self, Self::Error> {
        match form.requirement.as_str() {
            "none" => Ok(Self::NoMinimum),
            "subtotal" => Ok(Self::MinimumSubtotal {
                value: parse_decimal_field("min_value", form.min_value.as_deref())?,
            }),
            "quantity" => Ok(Self::MinimumQuantity {
                qty: parse_decimal_field("min_qty", form.min_qty.as_deref())?,
            }),
            other => Err(AppError::BadRequest(format!(
                "unknown minimum requirement: {other:?}"
            ))),
        }
    }
}

impl TryFrom<ActiveDatesForm> for FormEvent {
    type Error = AppError;

    fn try_from(form: ActiveDatesForm) -> Result<Self, Self::Error> {
        let starts_at = parse_datetime_field("starts_at", form.starts_at.as_deref())?
            .ok_or_else(|| AppError::BadRequest("start date is required".to_string()))?;

        Ok(Self::ActiveDates {
            starts_at,
            ends_at: parse_datetime_field("ends_at", form.ends_at.as_deref())?,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Order discount create page. Opens a fresh draft.
#[instrument(skip(state, launch), fields(shop = ?launch.shop, signed = launch.signed))]
pub async fn new_order_discount(
    launch: ShopifyLaunch,
    State(state): State<AppState>,
) -> OrderDiscountPageTemplate {
    let (draft_id, form) = state.drafts().create().await;
    tracing::info!(draft_id = %draft_id, host = ?launch.host, "Order discount page opened");

    OrderDiscountPageTemplate {
        draft_id: draft_id.to_string(),
        form: FormView::from(&form),
        summary: SummaryView::from(&form),
    }
}

/// Title and description card.
#[instrument(skip(state, form))]
pub async fn update_title(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<TitleForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    apply(
        &state,
        draft_id,
        FormEvent::Title {
            title: form.title,
            description: form.description,
        },
    )
    .await
}

/// Discount value card.
#[instrument(skip(state))]
pub async fn update_value(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<ValueForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    apply(&state, draft_id, FormEvent::try_from(form)?).await
}

/// Usage limit checkbox.
#[instrument(skip(state))]
pub async fn update_usage_limit(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<UsageLimitForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    let event = FormEvent::UsageLimit {
        once_per_customer: form.once_per_customer.is_some(),
    };
    apply(&state, draft_id, event).await
}

/// Minimum requirement card.
#[instrument(skip(state))]
pub async fn update_minimum(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<MinimumForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    apply(&state, draft_id, FormEvent::try_from(form)?).await
}

/// Combinations card.
#[instrument(skip(state))]
pub async fn update_combinations(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<CombinationsForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    let event = FormEvent::Combinations {
        shipping_discounts: form.shipping_discounts.is_some(),
    };
    apply(&state, draft_id, event).await
}

/// Active dates card.
#[instrument(skip(state))]
pub async fn update_active_dates(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    Form(form): Form<ActiveDatesForm>,
) -> Result<DiscountSummaryTemplate, AppError> {
    apply(&state, draft_id, FormEvent::try_from(form)?).await
}

/// Banner card (multipart).
///
/// Reads `banner_file` and `banner_description`. An empty file field means
/// "no new file" and leaves the current banner in place.
#[instrument(skip(state, multipart))]
pub async fn update_banner(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    mut multipart: Multipart,
) -> Result<DiscountSummaryTemplate, AppError> {
    let mut events = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("banner_file") => {
                let filename = field.file_name().unwrap_or("banner").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;

                if bytes.is_empty() {
                    continue;
                }

                let file = BannerFile::new(filename, mime_type, bytes);
                if !file.is_image() {
                    return Err(AppError::BadRequest(format!(
                        "Banner must be an image, got {}",
                        file.mime_type
                    )));
                }
                events.push(FormEvent::BannerFile(file));
            }
            Some("banner_description") => {
                let description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
                events.push(FormEvent::BannerDescription { description });
            }
            _ => {}
        }
    }

    let form = state
        .drafts()
        .apply_all(draft_id, events)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    Ok(DiscountSummaryTemplate::from(&form))
}

/// Save button.
///
/// The draft is taken out of the store for the duration of the submit, so a
/// second Save on the same page gets 404 instead of a duplicate discount. On
/// success the merchant is sent back to the admin discount list. On failure
/// the draft is put back and an error notice is returned so Save can be
/// retried.
#[instrument(skip(state, headers))]
pub async fn submit(
    State(state): State<AppState>,
    Path(draft_id): Path<DraftId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let form = state
        .drafts()
        .take(draft_id)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    match services::submit(state.shopify(), state.discount_api(), &form).await {
        Ok(outcome) => {
            tracing::info!(
                draft_id = %draft_id,
                status = outcome.response.status,
                banner = outcome.banner.as_str(),
                "Order discount created"
            );

            let redirect =
                AdminRedirect::to_section(&state.config().shopify.store, AdminSection::Discounts);
            Ok(redirect.respond(&headers))
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                draft_id = %draft_id,
                error = %e,
                sentry_event_id = %event_id,
                "Order discount creation failed"
            );
            state.drafts().restore(draft_id, form).await;

            Ok((
                StatusCode::BAD_GATEWAY,
                SubmitErrorTemplate {
                    message: submit_error_message(&e),
                },
            )
                .into_response())
        }
    }
}

async fn apply(
    state: &AppState,
    draft_id: DraftId,
    event: FormEvent,
) -> Result<DiscountSummaryTemplate, AppError> {
    let form = state
        .drafts()
        .apply(draft_id, event)
        .await
        .ok_or(AppError::DraftNotFound(draft_id))?;

    Ok(DiscountSummaryTemplate::from(&form))
}

fn submit_error_message(err: &DiscountApiError) -> String {
    match err {
        DiscountApiError::Status { status, .. } => format!(
            "The discount could not be created (discount service returned {status}). Your changes are kept, try saving again."
        ),
        DiscountApiError::Http(_) => {
            "The discount service could not be reached. Your changes are kept, try saving again."
                .to_string()
        }
    }
}

/// Routes under `/discounts/order`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new_order_discount))
        .route("/{draft}/title", post(update_title))
        .route("/{draft}/value", post(update_value))
        .route("/{draft}/usage-limit", post(update_usage_limit))
        .route("/{draft}/minimum", post(update_minimum))
        .route("/{draft}/combinations", post(update_combinations))
        .route("/{draft}/active-dates", post(update_active_dates))
        .route(
            "/{draft}/banner",
            post(update_banner).layer(DefaultBodyLimit::max(MAX_BANNER_UPLOAD_BYTES)),
        )
        .route("/{draft}/submit", post(submit))
}
