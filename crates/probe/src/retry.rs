//! Bounded retry for flaky interactions.
//!
//! An interaction is performed, then verified; if verification fails the
//! interaction is repeated up to a fixed number of attempts.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Policy with `attempts` tries and no pause
    #[must_use]
    pub const fn new(attempts: u32) -> Self {
        Self {
            attempts,
            delay: Duration::ZERO,
        }
    }

    /// Set the pause between attempts
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Single attempt, no retry
    #[must_use]
    pub const fn once() -> Self {
        Self::new(1)
    }

    /// Run `act`, then `verify`, until verification passes.
    ///
    /// Errors from either closure abort immediately; only a `false`
    /// verification is retried. Returns the 1-based attempt that passed.
    ///
    /// # Errors
    ///
    /// [`ProbeError::RetriesExhausted`] once every attempt failed verification.
    pub async fn run<A, AFut, V, VFut>(&self, action: &str, mut act: A, mut verify: V) -> ProbeResult<u32>
    where
        A: FnMut() -> AFut,
        AFut: Future<Output = ProbeResult<()>>,
        V: FnMut() -> VFut,
        VFut: Future<Output = ProbeResult<bool>>,
    {
        let attempts = self.attempts.max(1);
        for attempt in 1..=attempts {
            act().await?;
            if verify().await? {
                return Ok(attempt);
            }
            tracing::warn!(action, attempt, attempts, "verification failed, retrying");
            if attempt < attempts && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
        Err(ProbeError::RetriesExhausted {
            action: action.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_is_three_attempts() {
        assert_eq!(RetryPolicy::default().attempts, 3);
        assert_eq!(RetryPolicy::once().attempts, 1);
    }

    #[tokio::test]
    async fn test_passes_on_second_attempt() {
        let acts = Arc::new(AtomicU32::new(0));
        let a = acts.clone();
        let attempt = RetryPolicy::new(3)
            .run(
                "type",
                move || {
                    a.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                },
                {
                    let acts = acts.clone();
                    move || {
                        let done = acts.load(Ordering::SeqCst) >= 2;
                        async move { Ok(done) }
                    }
                },
            )
            .await
            .unwrap();
        assert_eq!(attempt, 2);
        assert_eq!(acts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted() {
        let err = RetryPolicy::new(3)
            .with_delay(Duration::from_millis(1))
            .run("enter text", || async { Ok(()) }, || async { Ok(false) })
            .await
            .unwrap_err();
        match err {
            ProbeError::RetriesExhausted { action, attempts } => {
                assert_eq!(action, "enter text");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let attempt = RetryPolicy::new(0)
            .run("x", || async { Ok(()) }, || async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(attempt, 1);
    }

    #[tokio::test]
    async fn test_action_error_is_not_retried() {
        let verifies = Arc::new(AtomicU32::new(0));
        let v = verifies.clone();
        let err = RetryPolicy::new(3)
            .run(
                "x",
                || async { Err(ProbeError::page("detached")) },
                move || {
                    v.fetch_add(1, Ordering::SeqCst);
                    async { Ok(true) }
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::PageError { .. }));
        assert_eq!(verifies.load(Ordering::SeqCst), 0);
    }
}
