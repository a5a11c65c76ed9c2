//! Bounded Waits
//!
//! Every UI interaction is "wait for a condition, then act". A wait polls
//! an async check at a fixed interval until it yields a value or the
//! timeout expires, in which case it fails with [`ProbeError::Timeout`].
//! Errors returned by the check itself abort the wait immediately.

use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Timeout for the post-login header check (60 seconds)
pub const LOGIN_WAIT_TIMEOUT_MS: u64 = 60_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Value produced by a satisfied wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult<T> {
    /// Value returned by the check
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// What was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls async conditions with a bounded timeout
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a waiter with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Same polling interval, different timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = timeout_ms;
        self
    }

    /// Poll `check` until it returns `Some`.
    ///
    /// The check always runs at least once, even with a zero timeout.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Timeout`] when the budget is spent, or the check's own error.
    pub async fn until<T, F, Fut>(&self, waited_for: &str, mut check: F) -> ProbeResult<WaitResult<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<Option<T>>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        loop {
            if let Some(value) = check().await? {
                return Ok(WaitResult {
                    value,
                    elapsed: start.elapsed(),
                    waited_for: waited_for.to_string(),
                });
            }
            if start.elapsed() >= timeout {
                break;
            }
            tokio::time::sleep(self.options.poll_interval()).await;
        }
        tracing::debug!(waited_for, timeout_ms = self.options.timeout_ms, "wait expired");
        Err(ProbeError::Timeout {
            ms: self.options.timeout_ms,
            waited_for: waited_for.to_string(),
        })
    }

    /// Poll a boolean `check` until it holds
    ///
    /// # Errors
    ///
    /// [`ProbeError::Timeout`] when the budget is spent, or the check's own error.
    pub async fn until_true<F, Fut>(&self, waited_for: &str, mut check: F) -> ProbeResult<Duration>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<bool>>,
    {
        let result = self
            .until(waited_for, || {
                let fut = check();
                async move { Ok(fut.await?.then_some(())) }
            })
            .await?;
        Ok(result.elapsed)
    }
}
