//! Cart API suites against the live backend.
//!
//! Needs `config/test_config.toml` and `testdata/test_data.json` with a
//! valid token (or `STOREFRONT_CONFIG` / `STOREFRONT_DATA`).
//! Run with `cargo test -p storefront-probe --test live_api -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use storefront_probe::harness::{SuiteResults, TestHarness};
use storefront_probe::report::TracingSink;
use storefront_probe::scenarios::api::{negative_suite, positive_suite};
use storefront_probe::{ApiSession, Settings, TestData};

fn workspace_file(var: &str, relative: &str) -> PathBuf {
    std::env::var_os(var).map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative),
        PathBuf::from,
    )
}

fn session() -> ApiSession {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let settings = Settings::load(workspace_file("STOREFRONT_CONFIG", "config/test_config.toml"))
        .expect("config");
    let data = TestData::load(workspace_file("STOREFRONT_DATA", "testdata/test_data.json"))
        .expect("test data");
    ApiSession::new(Arc::new(settings), &data, Arc::new(TracingSink)).expect("client")
}

fn assert_passed(results: &SuiteResults) {
    let failures: Vec<_> = results
        .failures()
        .into_iter()
        .map(|f| format!("{}: {}", f.name, f.error.clone().unwrap_or_default()))
        .collect();
    assert!(results.all_passed(), "{}: {failures:#?}", results.suite_name);
}

#[tokio::test]
#[ignore = "hits the live storefront API"]
async fn test_live_api_positive() {
    let session = session();
    let results = TestHarness::new().run(&mut positive_suite(&session), &session).await;
    assert_passed(&results);
}

#[tokio::test]
#[ignore = "hits the live storefront API"]
async fn test_live_api_negative() {
    let session = session();
    let results = TestHarness::new().run(&mut negative_suite(&session), &session).await;
    assert_passed(&results);
}
