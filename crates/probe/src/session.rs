//! Session wiring.
//!
//! One browser, one API client and one instance of every page object,
//! built once from injected settings and shared by every scenario.

use crate::api::CartApi;
use crate::browser;
use crate::config::Settings;
use crate::data::TestData;
use crate::driver::SharedDriver;
use crate::fixture::{
    AuthCookieFixture, CartItemFixture, ClearCartFixture, LoginFixture, RequestDelayFixture,
};
use crate::pages::{
    Authorization, BasePage, CartPage, MainPage, Navigation, PageTimeouts, SearchPage,
};
use crate::report::SharedSink;
use crate::result::ProbeResult;
use crate::retry::RetryPolicy;
use std::sync::Arc;

/// API-only session (no browser)
#[derive(Debug, Clone)]
pub struct ApiSession {
    /// Run settings
    pub settings: Arc<Settings>,
    /// Shared cart client
    pub api: Arc<CartApi>,
    /// Report observer
    pub sink: SharedSink,
}

impl ApiSession {
    /// Build the API client from injected settings and data
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(settings: Arc<Settings>, data: &TestData, sink: SharedSink) -> ProbeResult<Self> {
        let api = Arc::new(CartApi::new(&settings.api, data, sink.clone())?);
        Ok(Self {
            settings,
            api,
            sink,
        })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_api(settings: Arc<Settings>, api: Arc<CartApi>, sink: SharedSink) -> Self {
        Self {
            settings,
            api,
            sink,
        }
    }

    /// Class-scope pause between API groups
    #[must_use]
    pub fn request_delay_fixture(&self) -> RequestDelayFixture {
        RequestDelayFixture::new(self.settings.api.request_delay)
    }

    /// Ephemeral cart item for one test
    #[must_use]
    pub fn cart_item_fixture(&self) -> CartItemFixture {
        CartItemFixture::new(self.api.clone())
    }
}

/// Browser session with page objects
#[derive(Debug, Clone)]
pub struct Session {
    /// Run settings
    pub settings: Arc<Settings>,
    /// Account data
    pub data: TestData,
    /// Shared browser driver
    pub driver: SharedDriver,
    /// Shared cart client
    pub api: Arc<CartApi>,
    /// Login flow
    pub authorization: Authorization,
    /// Header navigation
    pub navigation: Navigation,
    /// Cart page
    pub cart: CartPage,
    /// Search page
    pub search: SearchPage,
    /// Main page
    pub main: MainPage,
    /// Report observer
    pub sink: SharedSink,
}

impl Session {
    /// Wire page objects and the API client around `driver`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(
        settings: Arc<Settings>,
        data: TestData,
        driver: SharedDriver,
        sink: SharedSink,
    ) -> ProbeResult<Self> {
        let api = Arc::new(CartApi::new(&settings.api, &data, sink.clone())?);
        Ok(Self::with_api(settings, data, driver, api, sink))
    }

    /// Wire page objects around `driver` with an existing client
    #[must_use]
    pub fn with_api(
        settings: Arc<Settings>,
        data: TestData,
        driver: SharedDriver,
        api: Arc<CartApi>,
        sink: SharedSink,
    ) -> Self {
        let base = BasePage::new(driver.clone(), PageTimeouts::from_settings(&settings.ui));
        Self {
            authorization: Authorization::new(base.clone(), &data, sink.clone()),
            navigation: Navigation::new(base.clone(), sink.clone()),
            cart: CartPage::new(base.clone(), sink.clone()),
            search: SearchPage::new(base.clone(), RetryPolicy::default(), sink.clone()),
            main: MainPage::new(base, settings.ui.base_url.clone()),
            settings,
            data,
            driver,
            api,
            sink,
        }
    }

    /// Launch the configured browser, open the storefront and wire the session
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be launched or the storefront
    /// does not load
    pub async fn launch(settings: Arc<Settings>, data: TestData, sink: SharedSink) -> ProbeResult<Self> {
        sink.step("open and configure browser");
        let driver = browser::launch(&settings.ui).await?;
        let session = Self::new(settings, data, driver, sink)?;
        if let Err(e) = session.main.go_main_page().await {
            let _ = session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    /// API view of this session
    #[must_use]
    pub fn api_session(&self) -> ApiSession {
        ApiSession::with_api(self.settings.clone(), self.api.clone(), self.sink.clone())
    }

    /// Clear the cart via API and reload
    #[must_use]
    pub fn clear_cart_fixture(&self) -> ClearCartFixture {
        ClearCartFixture::new(self.api.clone(), self.driver.clone())
    }

    /// Install the auth cookie
    #[must_use]
    pub fn auth_cookie_fixture(&self) -> AuthCookieFixture {
        AuthCookieFixture::new(self.driver.clone(), self.data.token.clone())
    }

    /// Log in once
    #[must_use]
    pub fn login_fixture(&self) -> LoginFixture {
        LoginFixture::new(self.authorization.clone())
    }

    /// Close the browser
    ///
    /// # Errors
    ///
    /// Returns an error if the browser does not shut down cleanly
    pub async fn close(&self) -> ProbeResult<()> {
        self.sink.step("close browser");
        self.driver.close().await
    }
}
