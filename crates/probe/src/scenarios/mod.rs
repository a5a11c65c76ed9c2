//! Scenario Suites
//!
//! The storefront checks, grouped into suites the [`TestHarness`] runs:
//!
//! - `api_positive` / `api_negative` over an [`ApiSession`]
//! - `ui_positive` / `ui_negative` over a browser [`Session`]
//!
//! [`TestHarness`]: crate::harness::TestHarness
//! [`ApiSession`]: crate::session::ApiSession
//! [`Session`]: crate::session::Session

pub mod api;
mod products;
pub mod ui;

pub use api::{CART_FIELDS, MESSAGE_ERROR_FIELDS, VALIDATION_ERROR_FIELDS};
pub use products::{ProductDictionary, ProductPair};
