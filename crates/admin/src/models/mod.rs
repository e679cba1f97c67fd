//! Domain models for the discount admin.
//!
//! - `banner` - Banner image held in memory until submit
//! - `discount_form` - Form state, change events and input parsing

pub mod banner;
pub mod discount_form;

pub use banner::BannerFile;
pub use discount_form::{
    BannerSnapshot, FieldError, FormEvent, FormSnapshot, FormState, MinimumRequirement,
    parse_datetime_field, parse_decimal_field,
};
