//! Fixture Management
//!
//! Async setup/teardown for shared test resources with a defined scope and
//! cleanup order.
//!
//! - Fixtures are set up highest priority first and torn down in reverse.
//! - A failed setup tears down everything already set up.
//! - [`FixtureManager::run`] always tears down, even when the body returns
//!   an error or panics.

mod storefront;

pub use storefront::{
    AuthCookieFixture, CartItem, CartItemFixture, CartItemHandle, ClearCartFixture,
    LoginFixture, RequestDelayFixture, ACCESS_TOKEN_COOKIE, COOKIE_DOMAIN,
};

use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Lifetime of a fixture relative to the tests that use it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureScope {
    /// Once per run (browser, login, cookies)
    Session,
    /// Once per group of tests
    Class,
    /// Around every test
    Function,
}

/// Trait for test fixtures that can be set up and torn down.
#[async_trait]
pub trait Fixture: Send + Sync {
    /// Set up the fixture before test execution.
    ///
    /// # Errors
    ///
    /// Returns an error if fixture setup fails.
    async fn setup(&mut self) -> ProbeResult<()>;

    /// Tear down the fixture after test execution.
    ///
    /// # Errors
    ///
    /// Returns an error if fixture teardown fails.
    async fn teardown(&mut self) -> ProbeResult<()>;

    /// Get the fixture name for logging/debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Scope this fixture is meant for
    fn scope(&self) -> FixtureScope {
        FixtureScope::Function
    }

    /// Get fixture priority (higher = set up first, tear down last).
    fn priority(&self) -> i32 {
        0
    }
}

/// State of a fixture in the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Fixture is registered but not set up.
    Registered,
    /// Fixture has been set up successfully.
    SetUp,
    /// Fixture has been torn down.
    TornDown,
    /// Fixture setup or teardown failed.
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
}

/// Ordered set of fixtures sharing one lifecycle
#[derive(Default)]
pub struct FixtureManager {
    fixtures: Vec<FixtureEntry>,
    setup_order: Vec<usize>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixtures", &self.names())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create a new fixture manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture (builder form)
    #[must_use]
    pub fn with(mut self, fixture: impl Fixture + 'static) -> Self {
        self.register(fixture);
        self
    }

    /// Register a fixture with the manager.
    pub fn register(&mut self, fixture: impl Fixture + 'static) {
        self.fixtures.push(FixtureEntry {
            fixture: Box::new(fixture),
            state: FixtureState::Registered,
        });
    }

    /// Get the number of registered fixtures.
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// Registered fixture names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fixtures.iter().map(|e| e.fixture.name()).collect()
    }

    /// State of the fixture called `name`
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        self.fixtures
            .iter()
            .find(|e| e.fixture.name() == name)
            .map(|e| e.state)
    }

    /// Set up all registered fixtures in priority order (highest first).
    ///
    /// Equal priorities keep registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if any fixture setup fails. Previously set up
    /// fixtures are torn down before returning the error.
    pub async fn setup_all(&mut self) -> ProbeResult<()> {
        let mut ordered: Vec<usize> = (0..self.fixtures.len()).collect();
        ordered.sort_by_key(|&i| std::cmp::Reverse(self.fixtures[i].fixture.priority()));

        self.setup_order.clear();
        let mut failure = None;

        for index in ordered {
            let entry = &mut self.fixtures[index];
            if !matches!(entry.state, FixtureState::Registered | FixtureState::TornDown) {
                continue;
            }
            tracing::debug!(fixture = entry.fixture.name(), "setup");
            if let Err(e) = entry.fixture.setup().await {
                entry.state = FixtureState::Failed;
                failure = Some(format!("Fixture '{}' setup failed: {e}", entry.fixture.name()));
                break;
            }
            entry.state = FixtureState::SetUp;
            self.setup_order.push(index);
        }

        if let Some(message) = failure {
            if let Err(e) = self.teardown_all().await {
                tracing::warn!(error = %e, "rollback after failed setup");
            }
            return Err(ProbeError::FixtureError { message });
        }
        Ok(())
    }

    /// Tear down all fixtures in reverse setup order.
    ///
    /// # Errors
    ///
    /// Returns an error if any fixture teardown fails. Other fixtures
    /// will still be torn down, but the first error is returned.
    pub async fn teardown_all(&mut self) -> ProbeResult<()> {
        let mut first_error: Option<ProbeError> = None;

        for index in std::mem::take(&mut self.setup_order).into_iter().rev() {
            let entry = &mut self.fixtures[index];
            if entry.state != FixtureState::SetUp {
                continue;
            }
            tracing::debug!(fixture = entry.fixture.name(), "teardown");
            if let Err(e) = entry.fixture.teardown().await {
                entry.state = FixtureState::Failed;
                if first_error.is_none() {
                    first_error = Some(ProbeError::FixtureError {
                        message: format!("Fixture '{}' teardown failed: {e}", entry.fixture.name()),
                    });
                }
            } else {
                entry.state = FixtureState::TornDown;
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Set up, run `body`, then tear down whatever happened.
    ///
    /// A body error wins over a teardown error (the latter is logged). A
    /// panicking body is resumed after teardown.
    ///
    /// # Errors
    ///
    /// Setup failure, the body's error, or the first teardown failure.
    pub async fn run<T, F, Fut>(&mut self, body: F) -> ProbeResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ProbeResult<T>> + Send,
    {
        self.setup_all().await?;
        let outcome = AssertUnwindSafe(body()).catch_unwind().await;
        let teardown = self.teardown_all().await;

        match outcome {
            Ok(Ok(value)) => teardown.map(|()| value),
            Ok(Err(e)) => {
                if let Err(t) = teardown {
                    tracing::warn!(error = %t, "teardown failed after test error");
                }
                Err(e)
            }
            Err(panic) => {
                if let Err(t) = teardown {
                    tracing::warn!(error = %t, "teardown failed after panic");
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}
