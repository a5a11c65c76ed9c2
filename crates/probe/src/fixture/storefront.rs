//! Storefront fixtures: cart state, rate-limit delay, auth cookie, login.

use super::{Fixture, FixtureScope};
use crate::api::CartApi;
use crate::driver::{Cookie, SharedDriver};
use crate::pages::{Authorization, Observation};
use crate::result::{ensure, ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Cookie the storefront reads the session token from
pub const ACCESS_TOKEN_COOKIE: &str = "access-token";
/// Domain the auth cookie is installed for
pub const COOKIE_DOMAIN: &str = "chitai-gorod.ru";

// =============================================================================
// CLEAR CART
// =============================================================================

/// Empties the remote cart through the API, then reloads the page
#[derive(Debug)]
pub struct ClearCartFixture {
    api: Arc<CartApi>,
    driver: SharedDriver,
}

impl ClearCartFixture {
    /// Create the fixture
    #[must_use]
    pub fn new(api: Arc<CartApi>, driver: SharedDriver) -> Self {
        Self { api, driver }
    }
}

#[async_trait]
impl Fixture for ClearCartFixture {
    async fn setup(&mut self) -> ProbeResult<()> {
        let response = self.api.clear_cart().await?;
        ensure(
            response.status < 300,
            format!("clear cart returned {}", response.status),
        )?;
        self.driver.reload().await
    }

    async fn teardown(&mut self) -> ProbeResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "api_clear_cart"
    }
}

// =============================================================================
// EPHEMERAL CART ITEM
// =============================================================================

/// Product placed in the cart for one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartItem {
    /// Catalog product id
    pub product_id: u64,
    /// Cart line holding it
    pub line_id: u64,
}

/// Test-side view of the item a [`CartItemFixture`] created
#[derive(Debug, Clone, Default)]
pub struct CartItemHandle(Arc<Mutex<Option<CartItem>>>);

impl CartItemHandle {
    /// Item currently in the cart
    ///
    /// # Errors
    ///
    /// [`ProbeError::FixtureError`] outside the fixture's setup/teardown window.
    pub fn get(&self) -> ProbeResult<CartItem> {
        self.lock().ok_or_else(|| ProbeError::FixtureError {
            message: "cart item is not set up".to_string(),
        })
    }

    fn lock(&self) -> Option<CartItem> {
        match self.0.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn replace(&self, item: Option<CartItem>) -> Option<CartItem> {
        let mut guard = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, item)
    }
}

/// Adds a top-listing product before the test and deletes it afterwards.
///
/// Teardown accepts a 404: tests that delete or clear the line themselves
/// leave nothing to remove.
#[derive(Debug)]
pub struct CartItemFixture {
    api: Arc<CartApi>,
    handle: CartItemHandle,
}

impl CartItemFixture {
    /// Create the fixture
    #[must_use]
    pub fn new(api: Arc<CartApi>) -> Self {
        Self {
            api,
            handle: CartItemHandle::default(),
        }
    }

    /// Handle the test body reads the item from
    #[must_use]
    pub fn handle(&self) -> CartItemHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl Fixture for CartItemFixture {
    async fn setup(&mut self) -> ProbeResult<()> {
        let product_id = self.api.get_random_id().await?;
        let response = self.api.add_product_to_cart(product_id).await?;
        ensure(
            response.status == 200,
            format!("adding product {product_id} returned {}", response.status),
        )?;
        let line = self
            .api
            .get_product_in_cart(product_id)
            .await?
            .ok_or_else(|| ProbeError::FixtureError {
                message: format!("product {product_id} missing from cart after add"),
            })?;
        let item = CartItem {
            product_id,
            line_id: line.id,
        };
        tracing::info!(?item, "cart item ready");
        let _ = self.handle.replace(Some(item));
        Ok(())
    }

    async fn teardown(&mut self) -> ProbeResult<()> {
        let Some(item) = self.handle.replace(None) else {
            return Ok(());
        };
        let response = self.api.delete_product_from_cart(item.line_id).await?;
        match response.status {
            204 => Ok(()),
            // the test body already removed it
            404 => {
                tracing::debug!(line_id = item.line_id, "cart item already gone");
                Ok(())
            }
            status => Err(ProbeError::FixtureError {
                message: format!("deleting cart line {} returned {status}", item.line_id),
            }),
        }
    }

    fn name(&self) -> &str {
        "cart_item"
    }
}

// =============================================================================
// REQUEST DELAY
// =============================================================================

/// Sleeps after a group of API tests to stay under the rate limit
#[derive(Debug, Clone, Copy)]
pub struct RequestDelayFixture {
    delay: Duration,
}

impl RequestDelayFixture {
    /// Delay applied at teardown
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Fixture for RequestDelayFixture {
    async fn setup(&mut self) -> ProbeResult<()> {
        Ok(())
    }

    async fn teardown(&mut self) -> ProbeResult<()> {
        tracing::debug!(delay_ms = self.delay.as_millis(), "request delay");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "request_delay"
    }

    fn scope(&self) -> FixtureScope {
        FixtureScope::Class
    }
}

// =============================================================================
// SESSION: COOKIE AND LOGIN
// =============================================================================

/// Installs the `access-token` cookie so account pages open without login
#[derive(Debug)]
pub struct AuthCookieFixture {
    driver: SharedDriver,
    token: String,
}

impl AuthCookieFixture {
    /// Create the fixture
    #[must_use]
    pub fn new(driver: SharedDriver, token: impl Into<String>) -> Self {
        Self {
            driver,
            token: token.into(),
        }
    }
}

#[async_trait]
impl Fixture for AuthCookieFixture {
    async fn setup(&mut self) -> ProbeResult<()> {
        self.driver
            .set_cookie(&Cookie::new(ACCESS_TOKEN_COOKIE, &self.token, COOKIE_DOMAIN))
            .await
    }

    async fn teardown(&mut self) -> ProbeResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "add_cookies"
    }

    fn scope(&self) -> FixtureScope {
        FixtureScope::Session
    }
}

/// Logs in once for the session
#[derive(Debug)]
pub struct LoginFixture {
    authorization: Authorization,
    outcome: Option<Observation>,
}

impl LoginFixture {
    /// Create the fixture
    #[must_use]
    pub const fn new(authorization: Authorization) -> Self {
        Self {
            authorization,
            outcome: None,
        }
    }

    /// Outcome of the login, once set up
    #[must_use]
    pub const fn outcome(&self) -> Option<&Observation> {
        self.outcome.as_ref()
    }
}

#[async_trait]
impl Fixture for LoginFixture {
    async fn setup(&mut self) -> ProbeResult<()> {
        let outcome = self.authorization.login_with().await?;
        if !outcome.is_observed() {
            tracing::warn!(?outcome, "login not confirmed in header");
        }
        self.outcome = Some(outcome);
        Ok(())
    }

    async fn teardown(&mut self) -> ProbeResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "auth"
    }

    fn scope(&self) -> FixtureScope {
        FixtureScope::Session
    }
}
