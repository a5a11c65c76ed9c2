//! Browser scenarios.
//!
//! Every case shares one browser, so cases only assume the state their
//! fixtures reset: the auth cookie or an API-cleared cart.

use super::ProductDictionary;
use crate::fixture::{Fixture, FixtureManager};
use crate::harness::{TestCase, TestSuite};
use crate::pages::{Observation, Section};
use crate::result::{ensure, ensure_eq, ProbeResult};
use crate::session::Session;
use futures::FutureExt;
use std::future::Future;

/// Products added by the cart scenarios
pub const CART_PRODUCTS: usize = 5;

/// Search results whose titles are compared with their product pages
pub const COMPARED_TITLES: usize = 5;

/// Positive browser suite
#[must_use]
pub fn positive_suite() -> TestSuite<Session> {
    TestSuite::new("ui_positive")
        .with_test(TestCase::new("login_with", |s| login_with(s).boxed()))
        .with_test(TestCase::new("go_profile", |s| go_profile(s).boxed()))
        .with_test(TestCase::new("go_orders", |s| go_orders(s).boxed()))
        .with_test(TestCase::new("go_bookmarks", |s| go_bookmarks(s).boxed()))
        .with_test(TestCase::new("go_cart", |s| go_cart(s).boxed()))
        .with_test(TestCase::new("go_main", |s| go_main(s).boxed()))
        .with_test(TestCase::new("validate_search_results", |s| {
            validate_search_results(s).boxed()
        }))
        .with_test(TestCase::new("compare_search", |s| compare_search(s).boxed()))
        .with_test(TestCase::new("clear_cart", |s| clear_cart(s).boxed()))
        .with_test(TestCase::new("add_products_to_cart", |s| {
            add_products_to_cart(s).boxed()
        }))
        .with_test(TestCase::new("total_amount", |s| total_amount(s).boxed()))
}

/// Negative browser suite: signed-out access to protected pages
#[must_use]
pub fn negative_suite() -> TestSuite<Session> {
    TestSuite::new("ui_negative")
        .with_test(TestCase::new("go_section_unauth", |s| go_section_unauth(s).boxed()))
        .with_test(TestCase::new("go_checkout_unauth", |s| {
            go_checkout_unauth(s).boxed()
        }))
}

async fn with_fixture<F, Fut>(fixture: impl Fixture + 'static, body: F) -> ProbeResult<()>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = ProbeResult<()>> + Send,
{
    FixtureManager::new().with(fixture).run(body).await
}

fn ensure_observed(outcome: &Observation, what: &str) -> ProbeResult<()> {
    ensure(
        outcome.is_observed(),
        format!("{what}: expected reaction not observed ({outcome:?})"),
    )
}

fn ensure_suffix(url: &str, suffix: &str) -> ProbeResult<()> {
    ensure(url.ends_with(suffix), format!("url {url} does not end with {suffix}"))
}

async fn search_random_product(session: &Session) -> ProbeResult<(&'static str, &'static str)> {
    let pair = ProductDictionary.choose();
    tracing::info!(query = pair.0, "searching");
    session.search.search_products(pair.0).await?;
    Ok(pair)
}

// =============================================================================
// POSITIVE
// =============================================================================

/// Phone login shows the account name in the header
pub async fn login_with(session: &Session) -> ProbeResult<()> {
    let outcome = session.authorization.login_with().await?;
    ensure_observed(&outcome, "login")
}

async fn open_section(session: &Session, section: Section) -> ProbeResult<()> {
    with_fixture(session.auth_cookie_fixture(), || async move {
        let url = session.navigation.go_section(section).await?;
        ensure_suffix(&url, section.url_suffix())
    })
    .await
}

/// Profile opens with the auth cookie
pub async fn go_profile(session: &Session) -> ProbeResult<()> {
    open_section(session, Section::Profile).await
}

/// Orders open with the auth cookie
pub async fn go_orders(session: &Session) -> ProbeResult<()> {
    open_section(session, Section::Orders).await
}

/// Bookmarks open with the auth cookie
pub async fn go_bookmarks(session: &Session) -> ProbeResult<()> {
    open_section(session, Section::Bookmarks).await
}

/// Cart opens without a token
pub async fn go_cart(session: &Session) -> ProbeResult<()> {
    let url = session.navigation.go_cart().await?;
    ensure_suffix(&url, ".ru/cart")
}

/// The logo leads back to the main page from every section
pub async fn go_main(session: &Session) -> ProbeResult<()> {
    with_fixture(session.auth_cookie_fixture(), || async move {
        let nav = &session.navigation;
        let mut urls = Vec::with_capacity(Section::ALL.len() + 1);
        for section in Section::ALL {
            nav.go_section(section).await?;
            urls.push(nav.go_main().await?);
        }
        nav.go_cart().await?;
        urls.push(nav.go_main().await?);

        let base_url = session.main.base_url();
        let strays: Vec<&String> = urls.iter().filter(|url| *url != base_url).collect();
        ensure(
            strays.is_empty(),
            format!("not every logo click led to {base_url}: {strays:?}"),
        )
    })
    .await
}

/// Results for a query match it in either language
pub async fn validate_search_results(session: &Session) -> ProbeResult<()> {
    let (query, translation) = search_random_product(session).await?;
    session
        .search
        .validate_search_results(&[query, translation])
        .await?;
    session.driver.reload().await
}

/// Result titles are compared with their product pages; mismatches are
/// reported, not failed
pub async fn compare_search(session: &Session) -> ProbeResult<()> {
    search_random_product(session).await?;
    let comparison = session
        .search
        .compare_search_and_product_titles(COMPARED_TITLES)
        .await?;
    tracing::info!(
        checked = comparison.checks.len(),
        mismatched = comparison.mismatches().len(),
        "title comparison"
    );
    session.main.go_main_page().await
}

/// Clearing from the cart page empties it and resets the indicator
pub async fn clear_cart(session: &Session) -> ProbeResult<()> {
    search_random_product(session).await?;
    session.cart.add_products_to_cart(CART_PRODUCTS).await?;
    session.navigation.go_cart().await?;
    session.cart.clear_cart().await?;
    session.driver.reload().await?;

    ensure_eq(&session.cart.get_cart_items_count().await?, &0, "cart lines after clear")?;
    ensure_eq(&session.cart.get_indicator_value().await?, &0, "indicator after clear")
}

/// Products added from search show up in the cart and the indicator
pub async fn add_products_to_cart(session: &Session) -> ProbeResult<()> {
    with_fixture(session.clear_cart_fixture(), || async move {
        search_random_product(session).await?;
        session.cart.add_products_to_cart(CART_PRODUCTS).await?;
        session.navigation.go_cart().await?;

        let lines = session.cart.get_cart_items_count().await?;
        let indicator = session.cart.get_indicator_value().await?;
        ensure_eq(&lines, &CART_PRODUCTS, "cart lines")?;
        ensure_eq(&usize::try_from(indicator).unwrap_or(usize::MAX), &CART_PRODUCTS, "indicator")?;
        session.cart.clear_cart().await
    })
    .await
}

/// Cart total equals the checkout total
pub async fn total_amount(session: &Session) -> ProbeResult<()> {
    with_fixture(session.auth_cookie_fixture(), || async move {
        search_random_product(session).await?;
        session.cart.add_products_to_cart(CART_PRODUCTS).await?;
        session.navigation.go_cart().await?;
        let cart_total = session.cart.total_amount_cart().await?;
        session.cart.go_checkout().await?;
        let order_total = session.cart.total_amount_order().await?;
        ensure_eq(&order_total, &cart_total, "order total")
    })
    .await
}

// =============================================================================
// NEGATIVE
// =============================================================================

async fn sign_out(session: &Session) -> ProbeResult<()> {
    session.driver.delete_all_cookies().await?;
    session.driver.reload().await
}

/// Signed out, every account section asks for authentication
pub async fn go_section_unauth(session: &Session) -> ProbeResult<()> {
    sign_out(session).await?;
    let mut outcomes = Vec::with_capacity(Section::ALL.len());
    for section in Section::ALL {
        outcomes.push((section, session.navigation.go_section_unauth(section).await?));
        session.driver.reload().await?;
    }
    for (section, outcome) in &outcomes {
        ensure_observed(outcome, &format!("{} without auth", section.as_str()))?;
    }
    Ok(())
}

/// Signed out, checkout asks for authentication
pub async fn go_checkout_unauth(session: &Session) -> ProbeResult<()> {
    sign_out(session).await?;
    search_random_product(session).await?;
    session.cart.add_products_to_cart(CART_PRODUCTS).await?;
    session.navigation.go_cart().await?;
    let outcome = session.cart.go_checkout_unauth().await?;
    ensure_observed(&outcome, "checkout without auth")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::CartApi;
    use crate::driver::{MockAction, MockDriver, MockElement};
    use crate::harness::{TestHarness, TestStatus};
    use crate::locator::Selector;
    use crate::pages::navigation_locators as locators;
    use crate::report::{NullSink, SharedSink};
    use crate::session::testing::{data, settings};
    use std::sync::Arc;

    fn session(driver: &MockDriver) -> Session {
        let sink: SharedSink = Arc::new(NullSink);
        let settings = settings("http://127.0.0.1:9/api/v1/cart", "http://127.0.0.1:9/top");
        let api = CartApi::with_endpoints(
            &settings.api.cart_url,
            &settings.api.top_products_url,
            "Bearer stub",
            sink.clone(),
        )
        .unwrap();
        Session::with_api(settings, data(), Arc::new(driver.clone()), Arc::new(api), sink)
    }

    fn wire_section(driver: &MockDriver, section: Section, url: &str) {
        driver.add_element(&section.button(), MockElement::new(""));
        driver.on_click(&section.button(), MockAction::Show(section.title(), MockElement::new("")));
        driver.on_click(&section.button(), MockAction::SetUrl(url.to_string()));
    }

    mod suite_tests {
        use super::*;

        #[test]
        fn test_suite_contents() {
            assert_eq!(positive_suite().test_count(), 11);
            assert_eq!(
                negative_suite().test_names(),
                vec!["go_section_unauth", "go_checkout_unauth"]
            );
        }

        #[tokio::test]
        async fn test_filtered_navigation_cases() {
            let driver = MockDriver::new();
            wire_section(&driver, Section::Profile, "https://www.chitai-gorod.ru/profile");
            let session = session(&driver);

            let results = TestHarness::new()
                .with_filter("go_profile")
                .run(&mut positive_suite(), &session)
                .await;
            let profile = results.results.iter().find(|r| r.name == "go_profile").unwrap();
            assert_eq!(profile.status, TestStatus::Passed, "{:?}", profile.error);
            assert_eq!(driver.cookies()[0].name, "access-token");
        }
    }

    mod scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_section_with_wrong_url_fails() {
            let driver = MockDriver::new();
            wire_section(&driver, Section::Orders, "https://www.chitai-gorod.ru/profile");
            let err = go_orders(&session(&driver)).await.unwrap_err();
            assert!(err.to_string().contains(".ru/profile/orders"));
        }

        #[tokio::test]
        async fn test_go_section_unauth_observed() {
            let driver = MockDriver::new();
            for section in Section::ALL {
                driver.add_element(&section.button(), MockElement::new(""));
                driver.on_click(
                    &section.button(),
                    MockAction::Show(Selector::xpath(locators::AUTH_MODAL_TEXT), MockElement::new("Войдите")),
                );
            }
            go_section_unauth(&session(&driver)).await.unwrap();
            assert!(driver.was_called("delete_all_cookies"));
            assert_eq!(driver.call_count("reload"), 4);
        }

        #[tokio::test]
        async fn test_go_section_unauth_missing_button_is_error() {
            let driver = MockDriver::new();
            assert!(go_section_unauth(&session(&driver)).await.is_err());
        }
    }
}
