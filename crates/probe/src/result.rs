//! Result and error types for the storefront probe.

use thiserror::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the storefront
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Configured browser has no driver in this build
    #[error("Unsupported browser '{name}': only chrome/chromium can be driven over CDP")]
    UnsupportedBrowser {
        /// Browser name from configuration
        name: String,
    },

    /// Page error (script evaluation, element interaction)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was awaited
        waited_for: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// An interaction kept failing its verification
    #[error("{action} did not succeed after {attempts} attempts")]
    RetriesExhausted {
        /// Interaction that was retried
        action: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// Configuration lookup or parse error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// Test data lookup error
    #[error("Test data error: {message}")]
    DataError {
        /// Error message
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Whether this error is an expired bounded wait
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Fail with an assertion error unless `condition` holds.
///
/// # Errors
///
/// Returns [`ProbeError::AssertionFailed`] carrying `message`.
pub fn ensure(condition: bool, message: impl Into<String>) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message))
    }
}

/// Fail with an assertion error unless `left == right`.
///
/// # Errors
///
/// Returns [`ProbeError::AssertionFailed`] showing both sides.
pub fn ensure_eq<T>(left: &T, right: &T, what: &str) -> ProbeResult<()>
where
    T: PartialEq + std::fmt::Debug + ?Sized,
{
    if left == right {
        Ok(())
    } else {
        Err(ProbeError::assertion(format!(
            "{what}: expected {right:?}, got {left:?}"
        )))
    }
}
