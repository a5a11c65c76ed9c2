//! Header navigation between storefront sections.

use super::{BasePage, Observation};
use crate::locator::Selector;
use crate::report::SharedSink;
use crate::result::{ProbeError, ProbeResult};
use std::str::FromStr;

/// Header and section locators
pub mod locators {
    /// Storefront logo
    pub const LOGO: &str = "//span[@class='header__logo-wrapper']";
    /// Main page banner strip
    pub const MAIN_BANNERS: &str = "//div[@class='main-page__banners']";
    /// Profile menu button
    pub const PROFILE_BUTTON: &str = "button.header-controls__btn[aria-label='Меню профиля']";
    /// Profile page heading
    pub const PROFILE_TITLE: &str = "//h2[@class='profile-page__title']";
    /// Orders button
    pub const ORDERS_BUTTON: &str =
        "button.header-controls__btn.header-controls__btn--mh[aria-label='Заказы']";
    /// Orders page heading
    pub const ORDERS_TITLE: &str = "//h2[@class='profile-orders-page__title']";
    /// Bookmarks button
    pub const BOOKMARKS_BUTTON: &str = "button.header-controls__btn[aria-label='Закладки']";
    /// Bookmarks page heading
    pub const BOOKMARKS_TITLE: &str = "//h1[@class='bookmarks-page__title']";
    /// Cart button
    pub const CART_BUTTON: &str = "button.header-controls__btn[aria-label='Корзина']";
    /// Cart page heading
    pub const CART_TITLE: &str = "//h1[@class='cart-page__title']";
    /// Text of the authentication modal
    pub const AUTH_MODAL_TEXT: &str = "//p[@class='auth-modal-content__text']";
}

/// Account sections behind the header buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Profile
    Profile,
    /// Order history
    Orders,
    /// Bookmarks
    Bookmarks,
}

impl Section {
    /// All account sections
    pub const ALL: [Self; 3] = [Self::Profile, Self::Orders, Self::Bookmarks];

    /// Header button for this section
    #[must_use]
    pub fn button(&self) -> Selector {
        Selector::css(match self {
            Self::Profile => locators::PROFILE_BUTTON,
            Self::Orders => locators::ORDERS_BUTTON,
            Self::Bookmarks => locators::BOOKMARKS_BUTTON,
        })
    }

    /// Heading shown once the section loaded
    #[must_use]
    pub fn title(&self) -> Selector {
        Selector::xpath(match self {
            Self::Profile => locators::PROFILE_TITLE,
            Self::Orders => locators::ORDERS_TITLE,
            Self::Bookmarks => locators::BOOKMARKS_TITLE,
        })
    }

    /// Section name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Orders => "orders",
            Self::Bookmarks => "bookmarks",
        }
    }

    /// URL suffix of the section page
    #[must_use]
    pub const fn url_suffix(&self) -> &'static str {
        match self {
            Self::Profile => ".ru/profile",
            Self::Orders => ".ru/profile/orders",
            Self::Bookmarks => ".ru/profile/bookmarks",
        }
    }
}

impl FromStr for Section {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "orders" => Ok(Self::Orders),
            "bookmarks" => Ok(Self::Bookmarks),
            other => Err(ProbeError::assertion(format!(
                "unknown section {other:?} (expected profile, orders or bookmarks)"
            ))),
        }
    }
}

/// Header navigation page object
#[derive(Debug, Clone)]
pub struct Navigation {
    base: BasePage,
    sink: SharedSink,
}

impl Navigation {
    /// Wrap a base page
    #[must_use]
    pub const fn new(base: BasePage, sink: SharedSink) -> Self {
        Self { base, sink }
    }

    async fn go(&self, step: &str, button: &Selector, landmark: &Selector) -> ProbeResult<String> {
        self.sink.step(step);
        self.base.click(button).await?;
        self.base
            .wait_visible(landmark, self.base.timeouts().element_ms)
            .await?;
        let url = self.base.current_url().await?;
        tracing::info!(%url, "{step}");
        Ok(url)
    }

    /// Logo click back to the main page
    pub async fn go_main(&self) -> ProbeResult<String> {
        self.go(
            "go to main page",
            &Selector::xpath(locators::LOGO),
            &Selector::xpath(locators::MAIN_BANNERS),
        )
        .await
    }

    /// Open the profile
    pub async fn go_profile(&self) -> ProbeResult<String> {
        self.go_section(Section::Profile).await
    }

    /// Open order history
    pub async fn go_orders(&self) -> ProbeResult<String> {
        self.go_section(Section::Orders).await
    }

    /// Open bookmarks
    pub async fn go_bookmarks(&self) -> ProbeResult<String> {
        self.go_section(Section::Bookmarks).await
    }

    /// Open an account section while signed in
    pub async fn go_section(&self, section: Section) -> ProbeResult<String> {
        self.go(
            &format!("go to {}", section.as_str()),
            &section.button(),
            &section.title(),
        )
        .await
    }

    /// Open the cart
    pub async fn go_cart(&self) -> ProbeResult<String> {
        self.go(
            "go to cart",
            &Selector::css(locators::CART_BUTTON),
            &Selector::xpath(locators::CART_TITLE),
        )
        .await
    }

    /// Click a section button while signed out and expect the auth modal
    pub async fn go_section_unauth(&self, section: Section) -> ProbeResult<Observation> {
        self.sink
            .step(&format!("open {} without auth", section.as_str()));
        self.base.click(&section.button()).await?;
        let outcome = Observation::from_wait(
            self.base
                .wait_visible(
                    &Selector::xpath(locators::AUTH_MODAL_TEXT),
                    self.base.timeouts().element_ms,
                )
                .await,
        )?;
        tracing::info!(section = section.as_str(), ?outcome, "unauth probe");
        Ok(outcome)
    }
}
