//! Test harness for running scenario suites.
//!
//! A [`TestSuite`] is a named list of async cases over a shared context
//! (an API session or a browser session) plus class-scope fixtures set up
//! before the first case and torn down after the last.

use crate::fixture::{Fixture, FixtureManager};
use crate::result::ProbeResult;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

/// Default per-case budget; login alone may wait a minute
pub const DEFAULT_CASE_TIMEOUT_MS: u64 = 120_000;

type CaseFn<C> = Box<dyn for<'a> Fn(&'a C) -> BoxFuture<'a, ProbeResult<()>> + Send + Sync>;

/// A single test case
pub struct TestCase<C> {
    /// Test name
    pub name: String,
    /// Test timeout in milliseconds
    pub timeout_ms: u64,
    body: CaseFn<C>,
}

impl<C> std::fmt::Debug for TestCase<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl<C> TestCase<C> {
    /// Create a new test case
    #[must_use]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a C) -> BoxFuture<'a, ProbeResult<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            timeout_ms: DEFAULT_CASE_TIMEOUT_MS,
            body: Box::new(body),
        }
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// A test suite containing multiple tests
pub struct TestSuite<C> {
    /// Suite name
    pub name: String,
    /// Tests in this suite
    pub tests: Vec<TestCase<C>>,
    class_fixtures: FixtureManager,
}

impl<C> std::fmt::Debug for TestSuite<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("tests", &self.tests)
            .field("class_fixtures", &self.class_fixtures)
            .finish()
    }
}

impl<C> TestSuite<C> {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            class_fixtures: FixtureManager::new(),
        }
    }

    /// Add a test case
    pub fn add_test(&mut self, test: TestCase<C>) {
        self.tests.push(test);
    }

    /// Add a test case (builder form)
    #[must_use]
    pub fn with_test(mut self, test: TestCase<C>) -> Self {
        self.add_test(test);
        self
    }

    /// Fixture spanning the whole suite
    #[must_use]
    pub fn with_class_fixture(mut self, fixture: impl Fixture + 'static) -> Self {
        self.class_fixtures.register(fixture);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Test names in run order
    #[must_use]
    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Test status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

/// Individual test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Test name
    pub name: String,
    /// Test status
    pub status: TestStatus,
    /// Duration of test execution
    pub duration: Duration,
    /// Error message if failed
    pub error: Option<String>,
    /// When the test finished
    pub timestamp: DateTime<Utc>,
}

impl TestResultEntry {
    /// Create a passing test result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Passed,
            duration,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            duration,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a skipped test result
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Skipped,
            duration: Duration::ZERO,
            error: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Individual test results
    pub results: Vec<TestResultEntry>,
    /// Class fixture setup/teardown failure, if any
    pub fixture_error: Option<String>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.fixture_error.is_none() && self.results.iter().all(|r| r.status != TestStatus::Failed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// Count skipped tests
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    fn count(&self, status: TestStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .collect()
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Test harness for running suites
#[derive(Debug, Default, Clone)]
pub struct TestHarness {
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Only run tests whose name contains this text
    pub filter: Option<String>,
}

impl TestHarness {
    /// Create a new test harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Only run tests whose name contains `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn selected<C>(&self, case: &TestCase<C>) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |f| case.name.contains(f))
    }

    /// Run a test suite sequentially against `ctx`
    pub async fn run<C: Sync>(&self, suite: &mut TestSuite<C>, ctx: &C) -> SuiteResults {
        let start = Instant::now();
        let mut results = Vec::new();
        tracing::info!(suite = %suite.name, tests = suite.tests.len(), "suite started");

        if !suite.tests.iter().any(|c| self.selected(c)) {
            return SuiteResults {
                suite_name: suite.name.clone(),
                results,
                fixture_error: None,
                duration: start.elapsed(),
            };
        }

        if let Err(e) = suite.class_fixtures.setup_all().await {
            tracing::error!(suite = %suite.name, error = %e, "class fixtures failed");
            for case in &suite.tests {
                if self.selected(case) {
                    results.push(TestResultEntry::skipped(&case.name, "class fixture setup failed"));
                }
            }
            return SuiteResults {
                suite_name: suite.name.clone(),
                results,
                fixture_error: Some(e.to_string()),
                duration: start.elapsed(),
            };
        }

        let mut stop = false;
        for case in suite.tests.iter().filter(|c| self.selected(c)) {
            if stop {
                results.push(TestResultEntry::skipped(&case.name, "fail-fast"));
                continue;
            }
            let entry = run_case(case, ctx).await;
            if entry.status == TestStatus::Failed && self.fail_fast {
                stop = true;
            }
            results.push(entry);
        }

        let fixture_error = suite.class_fixtures.teardown_all().await.err().map(|e| {
            tracing::error!(suite = %suite.name, error = %e, "class fixture teardown failed");
            e.to_string()
        });

        let results = SuiteResults {
            suite_name: suite.name.clone(),
            results,
            fixture_error,
            duration: start.elapsed(),
        };
        tracing::info!(
            suite = %results.suite_name,
            passed = results.passed_count(),
            failed = results.failed_count(),
            skipped = results.skipped_count(),
            "suite finished"
        );
        results
    }
}

async fn run_case<C: Sync>(case: &TestCase<C>, ctx: &C) -> TestResultEntry {
    let start = Instant::now();
    let budget = Duration::from_millis(case.timeout_ms);
    let outcome = tokio::time::timeout(budget, AssertUnwindSafe((case.body)(ctx)).catch_unwind()).await;
    let elapsed = start.elapsed();

    let entry = match outcome {
        Ok(Ok(Ok(()))) => TestResultEntry::passed(&case.name, elapsed),
        Ok(Ok(Err(e))) => TestResultEntry::failed(&case.name, elapsed, e.to_string()),
        Ok(Err(panic)) => TestResultEntry::failed(&case.name, elapsed, panic_message(&*panic)),
        Err(_) => TestResultEntry::failed(
            &case.name,
            elapsed,
            format!("exceeded {}ms test budget", case.timeout_ms),
        ),
    };
    match entry.status {
        TestStatus::Passed => tracing::info!(test = %entry.name, ?elapsed, "passed"),
        _ => tracing::warn!(test = %entry.name, error = ?entry.error, "failed"),
    }
    entry
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("panicked: {detail}")
}
