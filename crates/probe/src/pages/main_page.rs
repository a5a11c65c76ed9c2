//! Storefront entry page.

use super::BasePage;
use crate::result::ProbeResult;

/// Main page object
#[derive(Debug, Clone)]
pub struct MainPage {
    base: BasePage,
    base_url: String,
}

impl MainPage {
    /// Main page served at `base_url`
    #[must_use]
    pub fn new(base: BasePage, base_url: impl Into<String>) -> Self {
        Self {
            base,
            base_url: base_url.into(),
        }
    }

    /// Configured storefront URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Load the storefront
    pub async fn go_main_page(&self) -> ProbeResult<()> {
        tracing::info!(url = %self.base_url, "open main page");
        self.base.driver().navigate(&self.base_url).await
    }
}
