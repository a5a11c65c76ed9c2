//! Storefront Probe: end-to-end checks for the Chitai-Gorod storefront
//!
//! Drives the cart REST API and a Chromium browser through a small,
//! stable vocabulary of page objects, then runs scenario suites with
//! scoped fixtures.
//!
//! # Architecture
//!
//! ```text
//! ConfigProvider ─┐
//! DataProvider  ──┼─► Session ──► pages::* ──► PageDriver (CDP / mock)
//!                 │      └──────► CartApi  ──► reqwest
//!                 │
//! scenarios::* ───┴─► TestHarness ─► FixtureManager ─► SuiteResults
//! ```
//!
//! Reporting goes through a [`ReportSink`]; nothing in the crate talks to
//! a reporting backend directly.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod api;
pub mod browser;
pub mod config;
pub mod data;
pub mod driver;
pub mod fixture;
#[allow(clippy::missing_errors_doc)]
pub mod harness;
pub mod locator;
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod pages;
pub mod report;
pub mod result;
pub mod retry;
#[allow(clippy::missing_errors_doc)]
pub mod scenarios;
pub mod session;
pub mod wait;

pub use api::{ApiResponse, CartApi, CartLine};
pub use config::{ApiSettings, BrowserKind, ConfigProvider, Settings, UiSettings};
pub use data::{DataProvider, TestData};
pub use driver::{Cookie, PageDriver, SharedDriver};
pub use harness::{SuiteResults, TestCase, TestHarness, TestResultEntry, TestStatus, TestSuite};
pub use report::{Attachment, NullSink, ReportSink, SharedSink, TracingSink};
pub use result::{ProbeError, ProbeResult};
pub use retry::RetryPolicy;
pub use session::{ApiSession, Session};

/// Everything a scenario author needs
pub mod prelude {
    pub use super::api::*;
    pub use super::config::*;
    pub use super::data::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::pages::{
        Authorization, BasePage, CartPage, MainPage, Navigation, Observation, PageTimeouts,
        SearchPage, Section, TitleCheck, TitleComparison,
    };
    pub use super::report::*;
    pub use super::result::*;
    pub use super::retry::*;
    pub use super::scenarios::ProductDictionary;
    pub use super::session::*;
    pub use super::wait::*;
}
