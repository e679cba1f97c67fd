//! Form state for the order discount create page.
//!
//! One [`FormState`] lives for one page view. Each card on the page sends its
//! own [`FormEvent`] variant; [`FormState::apply`] is the only mutator and
//! [`FormState::resolve`] is the only place defaults are filled in before the
//! state is turned into a [`DiscountRequest`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shpfy_core::{
    BannerImage, CombinesWith, DiscountClass, DiscountKind, DiscountMetafields, DiscountRequest,
};

use super::banner::BannerFile;

/// Discount value shown when the page is first opened.
pub const DEFAULT_DISCOUNT_VALUE: Decimal = Decimal::TEN;

/// Value sent for a minimum requirement the merchant never set.
#[must_use]
pub fn unset_minimum() -> Decimal {
    Decimal::new(1, 1)
}

/// Mutable state behind the order discount form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: DiscountKind,
    pub discount_value: Decimal,
    /// Minimum subtotal. Zero while the quantity requirement is selected.
    pub min_value: Option<Decimal>,
    /// Minimum quantity. Zero while the subtotal requirement is selected.
    pub min_qty: Option<Decimal>,
    pub one_per_user: bool,
    pub combines_with: CombinesWith,
    pub banner_file: Option<BannerFile>,
    pub offer_description: String,
}

/// Option selected in the minimum requirement card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumRequirement {
    None,
    Subtotal,
    Quantity,
}

impl MinimumRequirement {
    /// Radio input value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Subtotal => "subtotal",
            Self::Quantity => "quantity",
        }
    }
}

/// A change reported by one card of the form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormEvent {
    /// Title and description card.
    Title {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    /// Discount value card.
    Value {
        #[serde(default)]
        discount_type: Option<DiscountKind>,
        #[serde(default)]
        value: Option<Decimal>,
    },
    /// Usage limit checkbox.
    UsageLimit { once_per_customer: bool },
    /// Minimum requirement card, "minimum purchase amount" selected.
    MinimumSubtotal {
        #[serde(default)]
        value: Option<Decimal>,
    },
    /// Minimum requirement card, "minimum quantity of items" selected.
    MinimumQuantity {
        #[serde(default)]
        qty: Option<Decimal>,
    },
    /// Minimum requirement card, "no minimum requirements" selected.
    NoMinimum,
    /// Combinations card.
    Combinations { shipping_discounts: bool },
    /// Active dates card.
    ActiveDates {
        starts_at: DateTime<Utc>,
        #[serde(default)]
        ends_at: Option<DateTime<Utc>>,
    },
    /// Banner card, file picked. Only arrives through multipart uploads.
    #[serde(skip_deserializing)]
    BannerFile(BannerFile),
    /// Banner card, offer text edited.
    BannerDescription { description: String },
}

impl FormEvent {
    /// Variant name, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::Value { .. } => "value",
            Self::UsageLimit { .. } => "usage_limit",
            Self::MinimumSubtotal { .. } => "minimum_subtotal",
            Self::MinimumQuantity { .. } => "minimum_quantity",
            Self::NoMinimum => "no_minimum",
            Self::Combinations { .. } => "combinations",
            Self::ActiveDates { .. } => "active_dates",
            Self::BannerFile(_) => "banner_file",
            Self::BannerDescription { .. } => "banner_description",
        }
    }
}

impl FormState {
    /// Fresh state for a page opened at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            title: None,
            description: None,
            starts_at: now,
            ends_at: None,
            discount_type: DiscountKind::Amount,
            discount_value: DEFAULT_DISCOUNT_VALUE,
            min_value: None,
            min_qty: None,
            one_per_user: true,
            combines_with: CombinesWith::order_class(false),
            banner_file: None,
            offer_description: String::new(),
        }
    }

    /// Apply one change event.
    ///
    /// No validation happens here; ranges and date order are the backend's
    /// concern.
    pub fn apply(&mut self, event: FormEvent) {
        match event {
            // Empty text counts as "not reported", like a missing field.
            FormEvent::Title { title, description } => {
                if let Some(title) = title.filter(|t| !t.is_empty()) {
                    self.title = Some(title);
                }
                if let Some(description) = description.filter(|d| !d.is_empty()) {
                    self.description = Some(description);
                }
            }
            FormEvent::Value {
                discount_type,
                value,
            } => {
                if let Some(kind) = discount_type {
                    self.discount_type = kind;
                }
                if let Some(value) = value {
                    self.discount_value = value;
                }
            }
            FormEvent::UsageLimit { once_per_customer } => {
                self.one_per_user = once_per_customer;
            }
            FormEvent::MinimumSubtotal { value } => {
                if let Some(value) = value {
                    self.min_value = Some(value);
                }
                self.min_qty = Some(Decimal::ZERO);
            }
            FormEvent::MinimumQuantity { qty } => {
                if let Some(qty) = qty {
                    self.min_qty = Some(qty);
                }
                self.min_value = Some(Decimal::ZERO);
            }
            FormEvent::NoMinimum => {
                self.min_value = None;
                self.min_qty = None;
            }
            FormEvent::Combinations { shipping_discounts } => {
                self.combines_with = CombinesWith::order_class(shipping_discounts);
            }
            FormEvent::ActiveDates { starts_at, ends_at } => {
                self.starts_at = starts_at;
                if let Some(ends_at) = ends_at {
                    self.ends_at = Some(ends_at);
                }
            }
            FormEvent::BannerFile(file) => {
                self.banner_file = Some(file);
            }
            FormEvent::BannerDescription { description } => {
                self.offer_description = description;
            }
        }
    }

    /// Which minimum requirement is currently selected.
    ///
    /// Switching modes zeroes the other minimum, so the zeroed side tells
    /// which mode is active.
    #[must_use]
    pub fn minimum_requirement(&self) -> MinimumRequirement {
        match (self.min_value, self.min_qty) {
            (None, None) => MinimumRequirement::None,
            (_, Some(qty)) if qty.is_zero() => MinimumRequirement::Subtotal,
            (Some(value), _) if value.is_zero() => MinimumRequirement::Quantity,
            (Some(_), _) => MinimumRequirement::Subtotal,
            (None, Some(_)) => MinimumRequirement::Quantity,
        }
    }

    /// Alt text for the uploaded banner: the offer text, else the filename.
    #[must_use]
    pub fn banner_alt_text(&self) -> String {
        let offer = self.offer_description.trim();
        if !offer.is_empty() {
            return offer.to_string();
        }
        self.banner_file
            .as_ref()
            .map(|file| file.filename.clone())
            .unwrap_or_default()
    }

    /// Build the backend request, filling every unset field with its default.
    #[must_use]
    pub fn resolve(&self, banner_image: Option<BannerImage>) -> DiscountRequest {
        let offer = self.offer_description.trim();

        DiscountRequest {
            title: self.title.clone().unwrap_or_default(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            metafields: DiscountMetafields {
                class: DiscountClass::Order,
                discount_type: self.discount_type,
                discount_value: self.discount_value,
                description: self.description.clone().unwrap_or_default(),
                min_value: self.min_value.unwrap_or_else(unset_minimum),
                min_qty: self.min_qty.unwrap_or_else(unset_minimum),
                one_per_user: self.one_per_user,
                products: vec![],
                collections: vec![],
                banner_image,
                banner_description: (!offer.is_empty()).then(|| offer.to_string()),
            },
            combines_with: CombinesWith::order_class(self.combines_with.shipping_discounts),
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Read-only view of a draft for the JSON API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: DiscountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_value: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_qty: Option<Decimal>,
    pub one_per_user: bool,
    pub combines_with: CombinesWith,
    pub banner: Option<BannerSnapshot>,
    pub offer_description: String,
}

/// Banner metadata without the file contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerSnapshot {
    pub filename: String,
    pub mime_type: String,
    pub size: usize,
}

impl From<&FormState> for FormSnapshot {
    fn from(state: &FormState) -> Self {
        Self {
            title: state.title.clone(),
            description: state.description.clone(),
            starts_at: state.starts_at,
            ends_at: state.ends_at,
            discount_type: state.discount_type,
            discount_value: state.discount_value,
            min_value: state.min_value,
            min_qty: state.min_qty,
            one_per_user: state.one_per_user,
            combines_with: state.combines_with,
            banner: state.banner_file.as_ref().map(|file| BannerSnapshot {
                filename: file.filename.clone(),
                mime_type: file.mime_type.clone(),
                size: file.size(),
            }),
            offer_description: state.offer_description.clone(),
        }
    }
}

// =============================================================================
// Form input parsing
// =============================================================================

/// Error for a form field that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value:?}")]
pub struct FieldError {
    /// Form field name.
    pub field: &'static str,
    /// Submitted value.
    pub value: String,
}

/// Parse an optional decimal form field. Blank means "not provided".
///
/// # Errors
///
/// Returns `FieldError` if the value is not a decimal number.
pub fn parse_decimal_field(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<Decimal>, FieldError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<Decimal>().map(Some).map_err(|_| FieldError {
        field,
        value: raw.to_string(),
    })
}

/// Parse an optional date/time form field. Blank means "not provided".
///
/// Accepts RFC 3339, `datetime-local` values (`2026-10-17T09:30`) and plain
/// dates (midnight UTC).
///
/// # Errors
///
/// Returns `FieldError` if the value matches none of the accepted formats.
pub fn parse_datetime_field(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, FieldError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| FieldError {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-10-17T12:00:00Z".parse().unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults_on_mount() {
        let state = FormState::new(now());
        assert_eq!(state.starts_at, now());
        assert_eq!(state.discount_type, DiscountKind::Amount);
        assert_eq!(state.discount_value, dec("10"));
        assert!(state.one_per_user);
        assert_eq!(state.title, None);
        assert_eq!(state.min_value, None);
        assert_eq!(state.min_qty, None);
        assert_eq!(state.combines_with, CombinesWith::default());
    }

    #[test]
    fn test_title_event_sets_title() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::Title {
            title: Some("Summer".to_string()),
            description: None,
        });
        assert_eq!(state.title.as_deref(), Some("Summer"));
        assert_eq!(state.description, None);
    }

    #[test]
    fn test_empty_title_is_ignored() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::Title {
            title: Some("Summer".to_string()),
            description: Some("Whole store".to_string()),
        });
        state.apply(FormEvent::Title {
            title: Some(String::new()),
            description: Some(String::new()),
        });

        assert_eq!(state.title.as_deref(), Some("Summer"));
        assert_eq!(state.description.as_deref(), Some("Whole store"));
    }

    #[test]
    fn test_event_without_title_keeps_title() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::Title {
            title: Some("Summer".to_string()),
            description: None,
        });
        state.apply(FormEvent::Title {
            title: None,
            description: Some("Whole store".to_string()),
        });
        state.apply(FormEvent::UsageLimit {
            once_per_customer: false,
        });

        assert_eq!(state.title.as_deref(), Some("Summer"));
        assert_eq!(state.description.as_deref(), Some("Whole store"));
    }

    #[test]
    fn test_value_event_updates_type_and_value_independently() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::Value {
            discount_type: Some(DiscountKind::Percentage),
            value: None,
        });
        assert_eq!(state.discount_type, DiscountKind::Percentage);
        assert_eq!(state.discount_value, DEFAULT_DISCOUNT_VALUE);

        state.apply(FormEvent::Value {
            discount_type: None,
            value: Some(dec("25")),
        });
        assert_eq!(state.discount_type, DiscountKind::Percentage);
        assert_eq!(state.discount_value, dec("25"));
    }

    #[test]
    fn test_subtotal_requirement_zeroes_quantity() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::MinimumQuantity {
            qty: Some(dec("3")),
        });
        state.apply(FormEvent::MinimumSubtotal {
            value: Some(dec("50")),
        });

        assert_eq!(state.min_value, Some(dec("50")));
        assert_eq!(state.min_qty, Some(Decimal::ZERO));
    }

    #[test]
    fn test_quantity_requirement_zeroes_subtotal() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::MinimumSubtotal {
            value: Some(dec("50")),
        });
        state.apply(FormEvent::MinimumQuantity {
            qty: Some(dec("3")),
        });

        assert_eq!(state.min_qty, Some(dec("3")));
        assert_eq!(state.min_value, Some(Decimal::ZERO));
    }

    #[test]
    fn test_requirement_mode_switch_without_amount_keeps_previous_amount() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::MinimumSubtotal {
            value: Some(dec("40")),
        });
        state.apply(FormEvent::MinimumSubtotal { value: None });

        assert_eq!(state.min_value, Some(dec("40")));
        assert_eq!(state.min_qty, Some(Decimal::ZERO));
    }

    #[test]
    fn test_minimum_requirement_follows_last_mode() {
        let mut state = FormState::new(now());
        assert_eq!(state.minimum_requirement(), MinimumRequirement::None);

        state.apply(FormEvent::MinimumSubtotal { value: None });
        assert_eq!(state.minimum_requirement(), MinimumRequirement::Subtotal);

        state.apply(FormEvent::MinimumQuantity {
            qty: Some(dec("4")),
        });
        assert_eq!(state.minimum_requirement(), MinimumRequirement::Quantity);

        state.apply(FormEvent::NoMinimum);
        assert_eq!(state.minimum_requirement(), MinimumRequirement::None);
    }

    #[test]
    fn test_no_minimum_clears_both() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::MinimumSubtotal {
            value: Some(dec("40")),
        });
        state.apply(FormEvent::NoMinimum);

        assert_eq!(state.min_value, None);
        assert_eq!(state.min_qty, None);
    }

    #[test]
    fn test_combinations_force_order_and_product_off() {
        let mut state = FormState::new(now());
        state.combines_with = CombinesWith {
            order_discounts: true,
            product_discounts: true,
            shipping_discounts: false,
        };

        state.apply(FormEvent::Combinations {
            shipping_discounts: true,
        });

        assert!(!state.combines_with.order_discounts);
        assert!(!state.combines_with.product_discounts);
        assert!(state.combines_with.shipping_discounts);
    }

    #[test]
    fn test_active_dates_keep_end_when_not_provided() {
        let mut state = FormState::new(now());
        let start: DateTime<Utc> = "2026-11-01T00:00:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2026-11-30T00:00:00Z".parse().unwrap();

        state.apply(FormEvent::ActiveDates {
            starts_at: start,
            ends_at: Some(end),
        });
        state.apply(FormEvent::ActiveDates {
            starts_at: start,
            ends_at: None,
        });

        assert_eq!(state.starts_at, start);
        assert_eq!(state.ends_at, Some(end));
    }

    #[test]
    fn test_banner_events() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::BannerFile(BannerFile::new(
            "banner.png",
            "image/png",
            Bytes::from_static(b"png"),
        )));
        state.apply(FormEvent::BannerDescription {
            description: "20% off everything".to_string(),
        });

        assert_eq!(state.banner_file.as_ref().map(|f| f.filename.as_str()), Some("banner.png"));
        assert_eq!(state.offer_description, "20% off everything");
        assert_eq!(state.banner_alt_text(), "20% off everything");
    }

    #[test]
    fn test_banner_alt_text_falls_back_to_filename() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::BannerFile(BannerFile::new(
            "banner.png",
            "image/png",
            Bytes::new(),
        )));
        assert_eq!(state.banner_alt_text(), "banner.png");
    }

    #[test]
    fn test_resolve_defaults_when_nothing_set() {
        let request = FormState::new(now()).resolve(None);

        assert_eq!(request.title, "");
        assert_eq!(request.starts_at, now());
        assert_eq!(request.ends_at, None);
        assert_eq!(request.metafields.class, DiscountClass::Order);
        assert_eq!(request.metafields.discount_type, DiscountKind::Amount);
        assert_eq!(request.metafields.discount_value, dec("10"));
        assert_eq!(request.metafields.description, "");
        assert_eq!(request.metafields.min_value, dec("0.1"));
        assert_eq!(request.metafields.min_qty, dec("0.1"));
        assert!(request.metafields.one_per_user);
        assert!(request.metafields.products.is_empty());
        assert!(request.metafields.collections.is_empty());
        assert_eq!(request.metafields.banner_description, None);
        assert_eq!(request.combines_with, CombinesWith::order_class(false));
    }

    #[test]
    fn test_resolve_keeps_selected_requirement() {
        let mut state = FormState::new(now());
        state.apply(FormEvent::MinimumQuantity {
            qty: Some(dec("2")),
        });

        let request = state.resolve(None);
        assert_eq!(request.metafields.min_qty, dec("2"));
        assert_eq!(request.metafields.min_value, Decimal::ZERO);
    }

    #[test]
    fn test_resolve_serializes_order_type() {
        let json = serde_json::to_value(FormState::new(now()).resolve(None)).unwrap();
        assert_eq!(json["metafields"]["type"], "order");
        assert_eq!(json["metafields"]["minValue"], 0.1);
        assert_eq!(json["metafields"]["minQty"], 0.1);
    }

    #[test]
    fn test_event_json_shapes() {
        let event: FormEvent =
            serde_json::from_str(r#"{"kind": "minimum_subtotal", "value": 25.5}"#).unwrap();
        assert_eq!(
            event,
            FormEvent::MinimumSubtotal {
                value: Some(dec("25.5"))
            }
        );

        let event: FormEvent =
            serde_json::from_str(r#"{"kind": "value", "discount_type": "percent"}"#).unwrap();
        assert_eq!(
            event,
            FormEvent::Value {
                discount_type: Some(DiscountKind::Percentage),
                value: None
            }
        );

        let event: FormEvent = serde_json::from_str(r#"{"kind": "no_minimum"}"#).unwrap();
        assert_eq!(event, FormEvent::NoMinimum);
    }

    #[test]
    fn test_banner_file_event_cannot_arrive_as_json() {
        let result = serde_json::from_str::<FormEvent>(r#"{"kind": "banner_file"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_decimal_field() {
        assert_eq!(parse_decimal_field("value", None).unwrap(), None);
        assert_eq!(parse_decimal_field("value", Some("  ")).unwrap(), None);
        assert_eq!(
            parse_decimal_field("value", Some("12.50")).unwrap(),
            Some(dec("12.50"))
        );
        assert_eq!(
            parse_decimal_field("value", Some("ten")),
            Err(FieldError {
                field: "value",
                value: "ten".to_string()
            })
        );
    }

    #[test]
    fn test_parse_datetime_field_formats() {
        let expected: DateTime<Utc> = "2026-10-17T09:30:00Z".parse().unwrap();
        assert_eq!(
            parse_datetime_field("starts_at", Some("2026-10-17T09:30")).unwrap(),
            Some(expected)
        );
        assert_eq!(
            parse_datetime_field("starts_at", Some("2026-10-17T11:30:00+02:00")).unwrap(),
            Some(expected)
        );
        assert_eq!(
            parse_datetime_field("starts_at", Some("2026-10-17")).unwrap(),
            Some("2026-10-17T00:00:00Z".parse().unwrap())
        );
        assert_eq!(parse_datetime_field("ends_at", Some("")).unwrap(), None);
        assert!(parse_datetime_field("ends_at", Some("next week")).is_err());
    }
}
