//! Shpfy Core - Shared discount types library.
//!
//! This crate provides the types shared between the admin service and its
//! integration tests:
//! - `admin` - Embedded discount admin (order discount create page)
//! - `integration-tests` - Cross-crate tests driving the admin router
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The
//! `DiscountRequest` wire format lives here so both the service that sends it
//! and the tests that inspect it agree on one shape.
//!
//! # Modules
//!
//! - [`types`] - Discount enums, the backend request DTO, draft ids and shop domains

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
