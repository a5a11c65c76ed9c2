//! Terminal output

use console::{style, Term};
use storefront_probe::harness::{SuiteResults, TestStatus};

/// Line-oriented progress output on stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    fn prefix(&self, status: TestStatus) -> String {
        match (status, self.use_color) {
            (TestStatus::Passed, true) => style("✓").green().bold().to_string(),
            (TestStatus::Failed, true) => style("✗").red().bold().to_string(),
            (TestStatus::Skipped, true) => style("-").yellow().bold().to_string(),
            (TestStatus::Passed, false) => "PASS".to_string(),
            (TestStatus::Failed, false) => "FAIL".to_string(),
            (TestStatus::Skipped, false) => "SKIP".to_string(),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self
            .term
            .write_line(&format!("{} {message}", self.prefix(TestStatus::Passed)));
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", self.prefix(TestStatus::Failed)));
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(message);
    }

    /// Print one line per scenario and a summary line
    pub fn suite(&self, results: &SuiteResults) {
        self.info(&self.header(&results.suite_name));
        if let Some(ref error) = results.fixture_error {
            self.failure(&format!("class fixture: {error}"));
        }
        for entry in &results.results {
            let line = format!(
                "{} {} ({} ms)",
                self.prefix(entry.status),
                entry.name,
                entry.duration.as_millis()
            );
            if entry.status == TestStatus::Failed {
                let _ = self.term.write_line(&line);
                if let Some(ref error) = entry.error {
                    let _ = self.term.write_line(&format!("    {error}"));
                }
            } else {
                self.info(&line);
            }
        }
        self.info(&summary_line(results));
    }

    fn header(&self, name: &str) -> String {
        if self.use_color {
            style(name).bold().underlined().to_string()
        } else {
            name.to_string()
        }
    }
}

/// `passed/failed/skipped` counts with the elapsed time
#[must_use]
pub fn summary_line(results: &SuiteResults) -> String {
    format!(
        "{} passed, {} failed, {} skipped in {:.1}s",
        results.passed_count(),
        results.failed_count(),
        results.skipped_count(),
        results.duration.as_secs_f64()
    )
}
