//! Cart page and header cart indicator.

use super::{BasePage, Observation};
use crate::locator::Selector;
use crate::report::SharedSink;
use crate::result::{ProbeError, ProbeResult};

/// Cart locators
pub mod locators {
    /// "Купить" buttons on product cards
    pub const BUY_BUTTONS: &str = "//div[@class='chg-app-button__content' and text()=' Купить']";
    /// Item counter on the header cart button
    pub const CART_INDICATOR: &str = "//div[contains(@class, 'chg-indicator') and contains(@class, 'chg-indicator--bg-cherry') and contains(@class, 'chg-indicator--mod-m-l') and contains(@class, 'header-controls__indicator')]";
    /// "Товары в наличии" block title
    pub const AVAILABILITY_TITLE: &str =
        "//div[@class='cart-page__availability-title' and text()='Товары в наличии']";
    /// "Очистить корзину" link
    pub const CLEAR_CART: &str =
        "//span[@class='cart-page__clear-cart-title' and text()='Очистить корзину']";
    /// Confirmation shown after clearing
    pub const CART_CLEARED: &str =
        "//p[@class='cart-multiple-delete__title' and text()='Корзина очищена']";
    /// Cart summary total
    pub const CART_TOTAL: &str =
        "//div[@class='info-item cart-sidebar__item-summary']//div[@class='info-item__value']";
    /// "Перейти к оформлению" button
    pub const CHECKOUT_BUTTON: &str =
        "//button[.//div[@class='chg-app-button__content' and text()=' Перейти к оформлению ']]";
    /// Checkout summary total
    pub const ORDER_TOTAL: &str =
        "(//div[@data-v-e74c0fec and contains(@class, 'checkout-summary__col')])[2]";
    /// One cart line
    pub const CART_ITEM: &str = "//div[@class='cart-item']";
    /// Text of the authentication modal
    pub const AUTH_MODAL_TEXT: &str = "//p[@class='auth-modal-content__text']";
}

/// Cart page object
#[derive(Debug, Clone)]
pub struct CartPage {
    base: BasePage,
    sink: SharedSink,
}

impl CartPage {
    /// Wrap a base page
    #[must_use]
    pub const fn new(base: BasePage, sink: SharedSink) -> Self {
        Self { base, sink }
    }

    /// Click "Купить" buttons until `count` products were added.
    ///
    /// Each click must raise the header indicator by one before the next
    /// click; the button list is reused from the start if it is shorter
    /// than `count`.
    pub async fn add_products_to_cart(&self, count: usize) -> ProbeResult<u32> {
        self.sink.step(&format!("add {count} products to cart"));
        let buttons = Selector::xpath(locators::BUY_BUTTONS);
        let available = self
            .base
            .wait_present(&buttons, self.base.timeouts().element_ms)
            .await?;
        let mut indicator = self.get_indicator_value().await?;

        for (clicked, index) in (0..available).cycle().take(count).enumerate() {
            self.base.driver().script_click(&buttons, index).await?;
            let expected = indicator + 1;
            self.base
                .wait_for(&format!("cart indicator to reach {expected}"), || async move {
                    Ok(self.read_indicator().await? == expected)
                })
                .await?;
            indicator = expected;
            tracing::debug!(clicked = clicked + 1, indicator, "product added");
        }
        Ok(indicator)
    }

    /// Header counter value, 0 when the badge is absent
    pub async fn get_indicator_value(&self) -> ProbeResult<u32> {
        let indicator = Selector::xpath(locators::CART_INDICATOR);
        if self.base.find_all_count(&indicator).await? == 0 {
            return Ok(0);
        }
        self.read_indicator().await
    }

    async fn read_indicator(&self) -> ProbeResult<u32> {
        let indicator = Selector::xpath(locators::CART_INDICATOR);
        match self.base.driver().text(&indicator).await? {
            None => Ok(0),
            Some(text) => text.trim().parse().map_err(|_| {
                ProbeError::page(format!("cart indicator shows {text:?}, not a number"))
            }),
        }
    }

    /// Clear the cart from the cart page
    pub async fn clear_cart(&self) -> ProbeResult<()> {
        self.sink.step("clear cart from cart page");
        let element_ms = self.base.timeouts().element_ms;
        self.base
            .wait_visible(&Selector::xpath(locators::AVAILABILITY_TITLE), element_ms)
            .await?;
        self.base.click(&Selector::xpath(locators::CLEAR_CART)).await?;
        self.base
            .wait_visible(&Selector::xpath(locators::CART_CLEARED), element_ms)
            .await
    }

    /// Cart summary total as displayed
    pub async fn total_amount_cart(&self) -> ProbeResult<String> {
        let total = Selector::xpath(locators::CART_TOTAL);
        self.base
            .wait_visible(&total, self.base.timeouts().element_ms)
            .await?;
        self.base.text(&total).await
    }

    /// Proceed to checkout
    pub async fn go_checkout(&self) -> ProbeResult<()> {
        self.sink.step("go to checkout");
        let button = Selector::xpath(locators::CHECKOUT_BUTTON);
        self.base
            .wait_visible(&button, self.base.timeouts().element_ms)
            .await?;
        self.base.driver().click(&button).await
    }

    /// Proceed to checkout while signed out and expect the auth modal
    pub async fn go_checkout_unauth(&self) -> ProbeResult<Observation> {
        self.go_checkout().await?;
        let outcome = Observation::from_wait(
            self.base
                .wait_visible(
                    &Selector::xpath(locators::AUTH_MODAL_TEXT),
                    self.base.timeouts().element_ms,
                )
                .await,
        )?;
        tracing::info!(?outcome, "unauth checkout probe");
        Ok(outcome)
    }

    /// Checkout summary total as displayed
    pub async fn total_amount_order(&self) -> ProbeResult<String> {
        self.base.text(&Selector::xpath(locators::ORDER_TOTAL)).await
    }

    /// Number of lines shown on the cart page
    pub async fn get_cart_items_count(&self) -> ProbeResult<usize> {
        self.base
            .find_all_count(&Selector::xpath(locators::CART_ITEM))
            .await
    }
}
