//! Page Objects
//!
//! Named storefront operations over a shared [`PageDriver`]. Each page
//! follows the same shape: wait for a precondition, act, optionally wait
//! for a postcondition. Locators are kept verbatim from the live DOM.

mod authorization;
mod cart;
mod main_page;
mod navigation;
mod search;

pub use authorization::{locators as authorization_locators, Authorization};
pub use cart::{locators as cart_locators, CartPage};
pub use main_page::MainPage;
pub use navigation::{locators as navigation_locators, Navigation, Section};
pub use search::{
    clean_title, locators as search_locators, normalize, SearchPage, TitleCheck, TitleComparison,
};

use crate::config::UiSettings;
use crate::driver::SharedDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{WaitOptions, Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS, LOGIN_WAIT_TIMEOUT_MS};
use serde::Serialize;

// =============================================================================
// OBSERVATION
// =============================================================================

/// Outcome of a probe that expects some UI reaction.
///
/// Only the probe's designated wait maps to `NotObserved`; every other
/// failure stays an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Observation {
    /// The expected reaction appeared in time
    Observed,
    /// The designated wait expired
    NotObserved {
        /// What was awaited
        waited_for: String,
        /// Wait budget in milliseconds
        timeout_ms: u64,
    },
}

impl Observation {
    /// Map a wait result: timeout becomes `NotObserved`, other errors propagate
    ///
    /// # Errors
    ///
    /// Any non-timeout error in `result`.
    pub fn from_wait<T>(result: ProbeResult<T>) -> ProbeResult<Self> {
        match result {
            Ok(_) => Ok(Self::Observed),
            Err(ProbeError::Timeout { ms, waited_for }) => Ok(Self::NotObserved {
                waited_for,
                timeout_ms: ms,
            }),
            Err(other) => Err(other),
        }
    }

    /// Whether the reaction was seen
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        matches!(self, Self::Observed)
    }
}

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Wait budgets used by page objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTimeouts {
    /// Element lookup budget (`ui.timeout`)
    pub implicit_ms: u64,
    /// Explicit condition waits
    pub element_ms: u64,
    /// Post-login header check
    pub login_ms: u64,
    /// Polling interval for every wait
    pub poll_interval_ms: u64,
}

impl Default for PageTimeouts {
    fn default() -> Self {
        Self {
            implicit_ms: 4_000,
            element_ms: DEFAULT_WAIT_TIMEOUT_MS,
            login_ms: LOGIN_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PageTimeouts {
    /// Defaults with the implicit wait taken from settings
    #[must_use]
    pub fn from_settings(ui: &UiSettings) -> Self {
        Self {
            implicit_ms: u64::try_from(ui.timeout.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }

    /// Uniform budget for every wait
    #[must_use]
    pub const fn uniform(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            implicit_ms: timeout_ms,
            element_ms: timeout_ms,
            login_ms: timeout_ms,
            poll_interval_ms,
        }
    }
}

// =============================================================================
// BASE PAGE
// =============================================================================

/// Shared driver plus wait helpers
#[derive(Debug, Clone)]
pub struct BasePage {
    driver: SharedDriver,
    timeouts: PageTimeouts,
}

impl BasePage {
    /// Wrap a driver
    #[must_use]
    pub const fn new(driver: SharedDriver, timeouts: PageTimeouts) -> Self {
        Self { driver, timeouts }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &SharedDriver {
        &self.driver
    }

    /// Wait budgets
    #[must_use]
    pub const fn timeouts(&self) -> &PageTimeouts {
        &self.timeouts
    }

    fn waiter(&self, timeout_ms: u64) -> Waiter {
        Waiter::with_options(
            WaitOptions::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(self.timeouts.poll_interval_ms),
        )
    }

    /// Wait until at least one element matches; returns the match count
    pub async fn wait_present(&self, selector: &Selector, timeout_ms: u64) -> ProbeResult<usize> {
        let driver = &self.driver;
        let result = self
            .waiter(timeout_ms)
            .until(&format!("presence of {selector}"), || async move {
                let n = driver.count(selector).await?;
                Ok((n > 0).then_some(n))
            })
            .await?;
        Ok(result.value)
    }

    /// Wait until the first match is rendered
    pub async fn wait_visible(&self, selector: &Selector, timeout_ms: u64) -> ProbeResult<()> {
        let driver = &self.driver;
        self.waiter(timeout_ms)
            .until_true(&format!("visibility of {selector}"), || async move {
                driver.is_visible(selector).await
            })
            .await?;
        Ok(())
    }

    /// Wait until the first match is rendered and enabled
    pub async fn wait_clickable(&self, selector: &Selector, timeout_ms: u64) -> ProbeResult<()> {
        let driver = &self.driver;
        self.waiter(timeout_ms)
            .until_true(&format!("{selector} to be clickable"), || async move {
                Ok(driver.is_visible(selector).await? && driver.is_enabled(selector).await?)
            })
            .await?;
        Ok(())
    }

    /// Wait until the first match's text contains `needle`; returns the text
    pub async fn wait_text_contains(
        &self,
        selector: &Selector,
        needle: &str,
        timeout_ms: u64,
    ) -> ProbeResult<String> {
        let driver = &self.driver;
        let result = self
            .waiter(timeout_ms)
            .until(&format!("{selector} to contain {needle:?}"), || async move {
                Ok(driver
                    .text(selector)
                    .await?
                    .filter(|text| text.contains(needle)))
            })
            .await?;
        Ok(result.value)
    }

    /// Poll `check` until it holds, using the element budget
    pub async fn wait_for<F, Fut>(&self, waited_for: &str, check: F) -> ProbeResult<()>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ProbeResult<bool>>,
    {
        self.waiter(self.timeouts.element_ms)
            .until_true(waited_for, check)
            .await?;
        Ok(())
    }

    /// Element lookup under the implicit wait
    pub async fn find(&self, selector: &Selector) -> ProbeResult<()> {
        self.wait_present(selector, self.timeouts.implicit_ms).await?;
        Ok(())
    }

    /// Number of matches after the implicit wait; zero if none appear
    pub async fn find_all_count(&self, selector: &Selector) -> ProbeResult<usize> {
        match self.wait_present(selector, self.timeouts.implicit_ms).await {
            Ok(n) => Ok(n),
            Err(e) if e.is_timeout() => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Find then click
    pub async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        self.find(selector).await?;
        self.driver.click(selector).await
    }

    /// Find then read text
    pub async fn text(&self, selector: &Selector) -> ProbeResult<String> {
        self.find(selector).await?;
        self.driver
            .text(selector)
            .await?
            .ok_or_else(|| ProbeError::page(format!("{selector} vanished before it could be read")))
    }

    /// Current URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::testing::mock_page;
    use super::*;
    use crate::driver::MockElement;

    mod observation_tests {
        use super::*;

        #[test]
        fn test_timeout_maps_to_not_observed() {
            let outcome = Observation::from_wait::<()>(Err(ProbeError::Timeout {
                ms: 10,
                waited_for: "modal".to_string(),
            }))
            .unwrap();
            assert!(!outcome.is_observed());
            assert_eq!(
                outcome,
                Observation::NotObserved {
                    waited_for: "modal".to_string(),
                    timeout_ms: 10
                }
            );
        }

        #[test]
        fn test_other_errors_propagate() {
            assert!(Observation::from_wait::<()>(Err(ProbeError::page("x"))).is_err());
            assert!(Observation::from_wait(Ok(1)).unwrap().is_observed());
        }

        #[test]
        fn test_serialization() {
            let json = serde_json::to_string(&Observation::Observed).unwrap();
            assert_eq!(json, r#"{"outcome":"observed"}"#);
        }
    }

    mod base_page_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_all_count_zero_on_timeout() {
            let (_driver, base) = mock_page();
            assert_eq!(base.find_all_count(&Selector::css(".x")).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_wait_clickable_rejects_disabled() {
            let (driver, base) = mock_page();
            let sel = Selector::css("button");
            driver.add_element(&sel, MockElement::new("Go").disabled());
            assert!(base.wait_clickable(&sel, 50).await.unwrap_err().is_timeout());
        }

        #[tokio::test]
        async fn test_wait_text_contains() {
            let (driver, base) = mock_page();
            let sel = Selector::css("span");
            driver.add_element(&sel, MockElement::new("Привет, Ирина"));
            let text = base.wait_text_contains(&sel, "Ирина", 50).await.unwrap();
            assert_eq!(text, "Привет, Ирина");
        }

        #[tokio::test]
        async fn test_click_missing_is_timeout() {
            let (_driver, base) = mock_page();
            assert!(base.click(&Selector::css("#none")).await.unwrap_err().is_timeout());
        }

        #[test]
        fn test_timeouts_from_settings() {
            let ui = UiSettings {
                base_url: "https://www.chitai-gorod.ru/".to_string(),
                browser: crate::config::BrowserKind::Chromium,
                timeout: std::time::Duration::from_secs(4),
                headless: true,
                window_width: 1920,
                window_height: 1080,
                chromium_path: None,
            };
            let t = PageTimeouts::from_settings(&ui);
            assert_eq!(t.implicit_ms, 4_000);
            assert_eq!(t.element_ms, 10_000);
            assert_eq!(t.login_ms, 60_000);
        }
    }
}
