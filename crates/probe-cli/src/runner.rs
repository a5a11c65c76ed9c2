//! Suite runner and direct API commands

use crate::commands::{CartAction, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use storefront_probe::harness::{SuiteResults, TestHarness};
use storefront_probe::report::{MemorySink, ReportEvent, SharedSink, TracingSink};
use storefront_probe::scenarios;
use storefront_probe::{ApiResponse, ApiSession, CartApi, Session, Settings, TestData};

/// Everything one `run` produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Per-suite results in execution order
    pub suites: Vec<SuiteResults>,
    /// Steps and attachments recorded during the run
    pub events: Vec<ReportEvent>,
}

impl RunReport {
    /// Scenarios that ran or were skipped
    #[must_use]
    pub fn total(&self) -> usize {
        self.suites.iter().map(SuiteResults::total).sum()
    }

    /// Scenarios that did not pass
    #[must_use]
    pub fn not_passed(&self) -> usize {
        self.suites
            .iter()
            .map(|s| s.total() - s.passed_count())
            .sum()
    }

    /// True iff every suite passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.suites.iter().all(SuiteResults::all_passed)
    }

    /// Write the report as pretty JSON
    pub fn write(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::report_generation(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Err unless every scenario passed
    pub fn into_outcome(self) -> CliResult<()> {
        if self.all_passed() {
            Ok(())
        } else {
            Err(CliError::ScenariosFailed {
                failed: self.not_passed(),
                total: self.total(),
            })
        }
    }
}

/// Loads settings once and drives suites or single API calls
#[derive(Debug)]
pub struct ProbeRunner {
    config: CliConfig,
    reporter: Reporter,
}

impl ProbeRunner {
    /// Create a runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Terminal reporter
    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Load typed settings and test data from the configured paths
    pub fn load(&self) -> CliResult<(Arc<Settings>, TestData)> {
        let settings = Settings::load(&self.config.config_path)?;
        let data = TestData::load(&self.config.data_path)?;
        Ok((Arc::new(settings), data))
    }

    /// Run the selected suites and print their results
    pub async fn run(&self, args: &RunArgs) -> CliResult<RunReport> {
        let (settings, data) = self.load()?;
        let started_at = Utc::now();
        let memory = Arc::new(MemorySink::new().forwarding_to(Arc::new(TracingSink)));
        let sink: SharedSink = memory.clone();

        let mut harness = TestHarness::new();
        if args.fail_fast {
            harness = harness.with_fail_fast();
        }
        if let Some(ref filter) = args.filter {
            harness = harness.with_filter(filter.clone());
        }

        let mut suites = Vec::new();
        if args.target.includes_api() {
            let session = ApiSession::new(settings.clone(), &data, sink.clone())?;
            for mut suite in [
                scenarios::api::positive_suite(&session),
                scenarios::api::negative_suite(&session),
            ] {
                suites.push(self.run_suite(&harness, &mut suite, &session).await);
            }
        }
        if args.target.includes_ui() {
            suites.extend(self.run_ui(&harness, settings, data, sink).await?);
        }

        let report = RunReport {
            started_at,
            suites,
            events: memory.drain(),
        };
        if let Some(ref path) = args.report {
            report.write(path)?;
            self.reporter.info(&format!("report written to {}", path.display()));
        }
        Ok(report)
    }

    async fn run_ui(
        &self,
        harness: &TestHarness,
        settings: Arc<Settings>,
        data: TestData,
        sink: SharedSink,
    ) -> CliResult<Vec<SuiteResults>> {
        let session = Session::launch(settings, data, sink).await?;
        let mut suites = Vec::new();
        for mut suite in [scenarios::ui::positive_suite(), scenarios::ui::negative_suite()] {
            suites.push(self.run_suite(harness, &mut suite, &session).await);
        }
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
        Ok(suites)
    }

    async fn run_suite<C: Sync>(
        &self,
        harness: &TestHarness,
        suite: &mut storefront_probe::TestSuite<C>,
        ctx: &C,
    ) -> SuiteResults {
        let results = harness.run(suite, ctx).await;
        self.reporter.suite(&results);
        results
    }

    fn api(&self) -> CliResult<CartApi> {
        let (settings, data) = self.load()?;
        Ok(CartApi::new(&settings.api, &data, Arc::new(TracingSink))?)
    }

    /// Perform one cart operation
    pub async fn cart(&self, action: CartAction) -> CliResult<ApiResponse> {
        let api = self.api()?;
        let response = match action {
            CartAction::View => api.view_cart_contents().await?,
            CartAction::Clear => api.clear_cart().await?,
            CartAction::Add { product_id } => api.add_product_to_cart(product_id).await?,
            CartAction::Remove { line_id } => api.delete_product_from_cart(line_id).await?,
        };
        Ok(response)
    }

    /// Id of a product from the top listing
    pub async fn random_id(&self) -> CliResult<u64> {
        Ok(self.api()?.get_random_id().await?)
    }

    /// Resolved settings as printable lines; the token is never shown
    pub fn check_config(&self) -> CliResult<String> {
        let (settings, data) = self.load()?;
        let api = &settings.api;
        let ui = &settings.ui;
        let lines = [
            format!("config:           {}", self.config.config_path.display()),
            format!("data:             {}", self.config.data_path.display()),
            format!("api.cart_url:     {}", api.cart_url),
            format!("api.top_products: {}", api.top_products_url),
            format!("api.request_delay: {}s", api.request_delay.as_secs()),
            format!("ui.base_url:      {}", ui.base_url),
            format!("ui.browser:       {}", ui.browser.as_str()),
            format!("ui.timeout:       {}s", ui.timeout.as_secs()),
            format!("ui.headless:      {}", ui.headless),
            format!("ui.window:        {}x{}", ui.window_width, ui.window_height),
            format!("account:          {} ({})", data.username, data.phone),
            format!(
                "token:            {}",
                if data.token.is_empty() { "missing" } else { "set" }
            ),
        ];
        Ok(lines.join("\n"))
    }
}

/// Render a response body for the terminal
#[must_use]
pub fn render_response(response: &ApiResponse) -> String {
    let body = if response.is_empty() {
        "<empty>".to_string()
    } else {
        response
            .json()
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| response.body.clone())
    };
    format!("HTTP {}\n{body}", response.status)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use storefront_probe::harness::TestResultEntry;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[api]
cart_url = "http://127.0.0.1:9/api/v1/cart"
request_delay = 2

[ui]
base_url = "https://www.chitai-gorod.ru/"
browser_name = "chrome"
timeout = 4
"#;

    const DATA: &str = r#"{"token": "Bearer secret", "phone": "9990001122", "username": "Ирина"}"#;

    fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(text.as_bytes())
            .unwrap();
        path
    }

    fn runner(dir: &TempDir) -> ProbeRunner {
        ProbeRunner::new(
            CliConfig::new()
                .with_config_path(write(dir, "test_config.toml", CONFIG))
                .with_data_path(write(dir, "test_data.json", DATA)),
        )
    }

    fn report(passed: bool) -> RunReport {
        let entry = if passed {
            TestResultEntry::passed("view_cart_contents", Duration::from_millis(5))
        } else {
            TestResultEntry::failed("view_cart_contents", Duration::from_millis(5), "status 500")
        };
        RunReport {
            started_at: Utc::now(),
            suites: vec![SuiteResults {
                suite_name: "api_positive".to_string(),
                results: vec![entry],
                fixture_error: None,
                duration: Duration::from_millis(5),
            }],
            events: vec![ReportEvent::Step {
                name: "view cart".to_string(),
            }],
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_check_config_hides_token() {
            let dir = TempDir::new().unwrap();
            let text = runner(&dir).check_config().unwrap();
            assert!(text.contains("http://127.0.0.1:9/api/v1/cart"));
            assert!(text.contains("ui.browser:       chrome"));
            assert!(text.contains("token:            set"));
            assert!(!text.contains("secret"));
        }

        #[test]
        fn test_missing_config_file() {
            let dir = TempDir::new().unwrap();
            let runner = ProbeRunner::new(
                CliConfig::new()
                    .with_config_path(dir.path().join("absent.toml"))
                    .with_data_path(write(&dir, "test_data.json", DATA)),
            );
            let err = runner.check_config().unwrap_err();
            assert!(err.to_string().contains("absent.toml"));
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_write_report() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("reports/run.json");
            report(true).write(&path).unwrap();

            let json: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(json["suites"][0]["suite_name"], "api_positive");
            assert_eq!(json["suites"][0]["results"][0]["status"], "passed");
            assert_eq!(json["events"][0]["event"], "step");
        }

        #[test]
        fn test_outcome() {
            assert!(report(true).into_outcome().is_ok());
            let err = report(false).into_outcome().unwrap_err();
            assert!(matches!(err, CliError::ScenariosFailed { failed: 1, total: 1 }));
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_empty_and_json() {
            let empty = ApiResponse {
                status: 204,
                body: String::new(),
            };
            assert_eq!(render_response(&empty), "HTTP 204\n<empty>");

            let json = ApiResponse {
                status: 404,
                body: r#"{"message":"x"}"#.to_string(),
            };
            assert!(render_response(&json).contains("\"message\": \"x\""));
        }
    }

    mod api_tests {
        use super::*;

        #[tokio::test]
        async fn test_cart_view_unreachable_is_http_error() {
            let dir = TempDir::new().unwrap();
            let err = runner(&dir).cart(CartAction::View).await.unwrap_err();
            assert!(matches!(err, CliError::Probe(_)));
        }
    }
}
