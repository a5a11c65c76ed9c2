//! Phone-number login flow.

use super::{BasePage, Observation};
use crate::data::TestData;
use crate::locator::Selector;
use crate::report::SharedSink;
use crate::result::ProbeResult;

/// Login form locators
pub mod locators {
    /// Header "Войти" control
    pub const LOGIN_BUTTON: &str = "//*[text()='Войти']";
    /// Phone number input in the auth modal
    pub const PHONE_INPUT: &str = "#tid-input";
    /// "Получить код" submit button
    pub const GET_CODE_BUTTON: &str = "//button[.//div[text()=' Получить код ']]";
    /// Header label showing the signed-in user
    pub const HEADER_USERNAME: &str = "//span[@class='header-controls__text']";
}

/// Login page object
#[derive(Debug, Clone)]
pub struct Authorization {
    base: BasePage,
    phone: String,
    username: String,
    sink: SharedSink,
}

impl Authorization {
    /// Create the page object for the account in `data`
    #[must_use]
    pub fn new(base: BasePage, data: &TestData, sink: SharedSink) -> Self {
        Self {
            base,
            phone: data.phone.clone(),
            username: data.username.clone(),
            sink,
        }
    }

    /// Sign in with the configured phone number.
    ///
    /// The confirmation code is entered out of band; the flow then waits
    /// up to the login budget for the header to show the configured
    /// username. Only that final wait maps to [`Observation::NotObserved`].
    pub async fn login_with(&self) -> ProbeResult<Observation> {
        self.sink.step("log in with phone number");
        let timeouts = *self.base.timeouts();

        self.base.click(&Selector::xpath(locators::LOGIN_BUTTON)).await?;

        let phone = Selector::css(locators::PHONE_INPUT);
        self.base.wait_visible(&phone, timeouts.element_ms).await?;
        self.base.driver().clear(&phone).await?;
        self.base.driver().type_text(&phone, &self.phone).await?;

        let get_code = Selector::xpath(locators::GET_CODE_BUTTON);
        self.base.wait_clickable(&get_code, timeouts.element_ms).await?;
        self.base.driver().click(&get_code).await?;

        let outcome = Observation::from_wait(
            self.base
                .wait_text_contains(
                    &Selector::xpath(locators::HEADER_USERNAME),
                    &self.username,
                    timeouts.login_ms,
                )
                .await,
        )?;
        tracing::info!(?outcome, "login");
        Ok(outcome)
    }

    /// Header text once it shows the configured username
    pub async fn auth_check(&self) -> ProbeResult<String> {
        self.base
            .wait_text_contains(
                &Selector::xpath(locators::HEADER_USERNAME),
                &self.username,
                self.base.timeouts().login_ms,
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockAction, MockDriver, MockElement};
    use crate::pages::testing::mock_page;
    use crate::report::MemorySink;
    use std::sync::Arc;

    fn data() -> TestData {
        TestData {
            token: "t".to_string(),
            phone: "9990001122".to_string(),
            username: "Ирина".to_string(),
        }
    }

    /// Login button opens the modal; "Получить код" signs the user in
    fn wire_login(driver: &MockDriver, signs_in: bool) {
        let login = Selector::xpath(locators::LOGIN_BUTTON);
        let get_code = Selector::xpath(locators::GET_CODE_BUTTON);
        let header = Selector::xpath(locators::HEADER_USERNAME);
        driver.add_element(&login, MockElement::new("Войти"));
        driver.add_element(&header, MockElement::new("Войти"));
        driver.on_click(
            &login,
            MockAction::Show(Selector::css(locators::PHONE_INPUT), MockElement::new("")),
        );
        driver.on_click(&login, MockAction::Show(get_code.clone(), MockElement::new(" Получить код ")));
        if signs_in {
            driver.on_click(&get_code, MockAction::SetText(header, "Ирина".to_string()));
        }
    }

    #[tokio::test]
    async fn test_login_observed() {
        let (driver, base) = mock_page();
        wire_login(&driver, true);
        let sink = Arc::new(MemorySink::new());
        let auth = Authorization::new(base, &data(), sink.clone());

        assert_eq!(auth.login_with().await.unwrap(), Observation::Observed);
        assert!(driver.history().iter().any(|c| c == "type_text:#tid-input=9990001122"));
        assert_eq!(auth.auth_check().await.unwrap(), "Ирина");
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn test_login_not_observed_when_header_unchanged() {
        let (driver, base) = mock_page();
        wire_login(&driver, false);
        let auth = Authorization::new(base, &data(), Arc::new(MemorySink::new()));
        let outcome = auth.login_with().await.unwrap();
        assert!(!outcome.is_observed());
    }

    #[tokio::test]
    async fn test_missing_phone_input_is_error() {
        let (driver, base) = mock_page();
        driver.add_element(&Selector::xpath(locators::LOGIN_BUTTON), MockElement::new("Войти"));
        let auth = Authorization::new(base, &data(), Arc::new(MemorySink::new()));
        assert!(auth.login_with().await.unwrap_err().is_timeout());
    }
}
