//! Catalog search and result checks.

use super::BasePage;
use crate::locator::Selector;
use crate::report::{Attachment, SharedSink};
use crate::result::{ProbeError, ProbeResult};
use crate::retry::RetryPolicy;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Search locators
pub mod locators {
    /// Header search input
    pub const SEARCH_INPUT: &str =
        "//input[@name='search' and @class='search-form__input search-form__input--search']";
    /// Catalog container shown with results
    pub const CATALOG_CONTENT: &str = "//div[@class='app-catalog__content']";
    /// Result product cards
    pub const RESULT_CARDS: &str =
        "//div[contains(@class, 'app-products-list app-catalog__list')]//article";
    /// Card attribute holding the product name
    pub const PRODUCT_NAME_ATTR: &str = "data-chg-product-name";
    /// Title link inside each card caption
    pub const CARD_TITLE_LINKS: &str = ".product-card__caption .product-card__title";
    /// Product page heading
    pub const PRODUCT_HEADING: &str = "h1[itemprop='name']";
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Lowercase, hyphens to spaces, ASCII punctuation removed
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace('-', " ")
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

fn title_noise() -> Option<&'static Regex> {
    static NOISE: OnceLock<Option<Regex>> = OnceLock::new();
    // "(...)" groups and "16+" style age marks
    NOISE
        .get_or_init(|| Regex::new(r"\s*\(.*?\)|\s*\d+\+").ok())
        .as_ref()
}

/// Strip parenthesised groups and age marks: `"Harry Potter (Special Edition) 16+"` becomes `"Harry Potter"`
#[must_use]
pub fn clean_title(title: &str) -> String {
    match title_noise() {
        Some(noise) => noise.replace_all(title, "").trim().to_string(),
        None => title.trim().to_string(),
    }
}

// =============================================================================
// TITLE COMPARISON REPORT
// =============================================================================

/// One search card compared with its product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleCheck {
    /// Product page URL
    pub url: String,
    /// Title shown on the search card
    pub search_title: String,
    /// Heading shown on the product page
    pub product_title: String,
    /// Cleaned, case-insensitive equality
    pub matches: bool,
}

/// Result of comparing search titles against product pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleComparison {
    /// Every card that was checked
    pub checks: Vec<TitleCheck>,
}

impl TitleComparison {
    /// Cards whose titles differ
    #[must_use]
    pub fn mismatches(&self) -> Vec<&TitleCheck> {
        self.checks.iter().filter(|c| !c.matches).collect()
    }

    /// No mismatches
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(|c| c.matches)
    }

    /// Turn mismatches into an assertion failure
    ///
    /// # Errors
    ///
    /// [`ProbeError::AssertionFailed`] listing every mismatch.
    pub fn ensure_consistent(&self) -> ProbeResult<()> {
        if self.is_consistent() {
            return Ok(());
        }
        let lines: Vec<String> = self
            .mismatches()
            .iter()
            .map(|c| format!("{:?} vs {:?} ({})", c.search_title, c.product_title, c.url))
            .collect();
        Err(ProbeError::assertion(format!(
            "title mismatch: {}",
            lines.join("; ")
        )))
    }
}

// =============================================================================
// SEARCH PAGE
// =============================================================================

/// Search page object
#[derive(Debug, Clone)]
pub struct SearchPage {
    base: BasePage,
    input_retry: RetryPolicy,
    sink: SharedSink,
}

impl SearchPage {
    /// Wrap a base page; search text entry uses `input_retry`
    #[must_use]
    pub const fn new(base: BasePage, input_retry: RetryPolicy, sink: SharedSink) -> Self {
        Self {
            base,
            input_retry,
            sink,
        }
    }

    /// Type `name` into the search box, submit, wait for results, reload
    pub async fn search_products(&self, name: &str) -> ProbeResult<()> {
        self.sink.step(&format!("search for {name:?}"));
        let input = Selector::xpath(locators::SEARCH_INPUT);
        self.base.find(&input).await?;
        let driver = self.base.driver();
        let field = &input;

        let attempt = self
            .input_retry
            .run(
                "enter search text",
                || async move {
                    driver.select_all_and_delete(field).await?;
                    driver.type_text(field, name).await
                },
                || async move { Ok(driver.input_value(field).await?.as_deref() == Some(name)) },
            )
            .await?;
        tracing::debug!(attempt, "search text entered");

        driver.press_enter(&input).await?;
        self.base
            .wait_present(
                &Selector::xpath(locators::CATALOG_CONTENT),
                self.base.timeouts().element_ms,
            )
            .await?;
        driver.reload().await
    }

    /// Require at least one variant to appear in at least one result name
    pub async fn validate_search_results(&self, variants: &[&str]) -> ProbeResult<()> {
        self.sink.step("validate search results");
        let cards = Selector::xpath(locators::RESULT_CARDS);
        self.base
            .wait_present(&cards, self.base.timeouts().element_ms)
            .await?;
        let names: Vec<String> = self
            .base
            .driver()
            .attributes(&cards, locators::PRODUCT_NAME_ATTR)
            .await?
            .into_iter()
            .flatten()
            .collect();
        self.sink
            .attach(Attachment::text("result names", names.join("\n")));

        let names: Vec<String> = names.iter().map(|n| normalize(n)).collect();
        let wanted: Vec<String> = variants.iter().map(|v| normalize(v)).collect();
        let found = names
            .iter()
            .any(|name| wanted.iter().any(|w| name.contains(w.as_str())));
        if found {
            Ok(())
        } else {
            Err(ProbeError::assertion(format!(
                "none of {variants:?} found in {} search results",
                names.len()
            )))
        }
    }

    /// Visit the first `count` results and compare card titles with headings.
    ///
    /// Mismatches are logged and returned, never raised.
    pub async fn compare_search_and_product_titles(&self, count: usize) -> ProbeResult<TitleComparison> {
        self.sink
            .step(&format!("compare {count} search titles with product pages"));
        let links = Selector::css(locators::CARD_TITLE_LINKS);
        self.base.find(&links).await?;
        let driver = self.base.driver();

        let hrefs = driver.attributes(&links, "href").await?;
        let titles = driver.attributes(&links, "title").await?;
        let origin = self.base.current_url().await?;

        let mut targets = Vec::new();
        for (href, title) in hrefs.into_iter().zip(titles).take(count) {
            let href = href.ok_or_else(|| ProbeError::page("search card without href"))?;
            let url = resolve(&origin, &href)?;
            targets.push((url, title.unwrap_or_default().trim().to_string()));
        }

        let heading = Selector::css(locators::PRODUCT_HEADING);
        let mut comparison = TitleComparison::default();
        for (url, search_title) in targets {
            driver.navigate(&url).await?;
            let product_title = self.base.text(&heading).await?;
            let matches = clean_title(&search_title.to_lowercase())
                == clean_title(&product_title.to_lowercase());
            if !matches {
                tracing::warn!(%url, %search_title, %product_title, "title mismatch");
            }
            comparison.checks.push(TitleCheck {
                url,
                search_title,
                product_title,
                matches,
            });
        }

        if let Ok(json) = serde_json::to_string_pretty(&comparison) {
            self.sink.attach(Attachment::json("title comparison", json));
        }
        Ok(comparison)
    }
}

fn resolve(origin: &str, href: &str) -> ProbeResult<String> {
    let base = reqwest::Url::parse(origin).map_err(|e| ProbeError::NavigationError {
        url: origin.to_string(),
        message: e.to_string(),
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ProbeError::NavigationError {
            url: href.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockAction, MockDriver, MockElement};
    use crate::pages::testing::mock_page;
    use crate::report::{MemorySink, NullSink};
    use proptest::prelude::*;
    use std::sync::Arc;

    mod text_tests {
        use super::*;

        #[test]
        fn test_clean_title() {
            assert_eq!(clean_title("Harry Potter (Special Edition) 16+"), "Harry Potter");
            assert_eq!(clean_title("Ведьмак. Последнее желание (у) 18+ "), "Ведьмак. Последнее желание");
            assert_eq!(clean_title("Diablo"), "Diablo");
        }

        #[test]
        fn test_normalize() {
            assert_eq!(normalize("Warcraft: Легенды"), "warcraft легенды");
            assert_eq!(normalize("Spider-Man!"), "spider man");
            assert_eq!(normalize("«Гарри Поттер»"), "«гарри поттер»");
        }

        proptest! {
            #[test]
            fn prop_clean_title_trimmed_and_shorter(s in "[a-zA-Zа-я ()0-9+]{0,40}") {
                let cleaned = clean_title(&s);
                prop_assert_eq!(cleaned.trim(), cleaned.as_str());
                prop_assert!(cleaned.len() <= s.len());
            }

            #[test]
            fn prop_normalize_has_no_ascii_punctuation(s in "\\PC{0,40}") {
                prop_assert!(!normalize(&s).chars().any(|c| c.is_ascii_punctuation()));
            }
        }
    }

    fn wire_search(driver: &MockDriver, names: &[&str]) {
        let input = Selector::xpath(locators::SEARCH_INPUT);
        driver.add_element(&input, MockElement::new(""));
        let mut cards = Vec::new();
        for name in names {
            cards.push(MockElement::new("").with_attr(locators::PRODUCT_NAME_ATTR, *name));
        }
        driver.on_enter(&input, MockAction::Show(Selector::xpath(locators::CATALOG_CONTENT), MockElement::new("")));
        driver.on_enter(&input, MockAction::Replace(Selector::xpath(locators::RESULT_CARDS), cards));
    }

    mod search_tests {
        use super::*;

        #[tokio::test]
        async fn test_search_and_validate() {
            let (driver, base) = mock_page();
            wire_search(&driver, &["Diablo IV. Книга Лорат", "Мир Warcraft"]);
            let search = SearchPage::new(base, RetryPolicy::default(), Arc::new(MemorySink::new()));

            search.search_products("Diablo").await.unwrap();
            assert!(driver.was_called("press_enter"));
            assert!(driver.was_called("reload"));
            search.validate_search_results(&["Diablo", "Диабло"]).await.unwrap();
        }

        #[tokio::test]
        async fn test_validate_no_match() {
            let (driver, base) = mock_page();
            wire_search(&driver, &["Ведьмак"]);
            let search = SearchPage::new(base, RetryPolicy::default(), Arc::new(NullSink));
            search.search_products("Diablo").await.unwrap();
            let err = search.validate_search_results(&["Diablo", "Диабло"]).await.unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
        }

        #[tokio::test]
        async fn test_flaky_input_retried() {
            let (driver, base) = mock_page();
            wire_search(&driver, &["Diablo"]);
            driver.ignore_keystrokes(2);
            let search = SearchPage::new(base, RetryPolicy::new(3), Arc::new(NullSink));
            search.search_products("Diablo").await.unwrap();
            assert_eq!(driver.call_count("type_text"), 3);
        }

        #[tokio::test]
        async fn test_input_retries_exhausted() {
            let (driver, base) = mock_page();
            wire_search(&driver, &["Diablo"]);
            driver.ignore_keystrokes(5);
            let search = SearchPage::new(base, RetryPolicy::new(3), Arc::new(NullSink));
            let err = search.search_products("Diablo").await.unwrap_err();
            assert!(matches!(err, ProbeError::RetriesExhausted { attempts: 3, .. }));
            assert!(!driver.was_called("press_enter"));
        }
    }

    mod compare_tests {
        use super::*;

        fn wire_products(driver: &MockDriver, cards: &[(&str, &str, &str)]) {
            let links = Selector::css(locators::CARD_TITLE_LINKS);
            let heading = Selector::css(locators::PRODUCT_HEADING);
            driver.set_url("https://www.chitai-gorod.ru/search?phrase=diablo");
            for (href, title, page_heading) in cards {
                driver.add_element(&links, MockElement::new("").with_attr("href", *href).with_attr("title", *title));
                let url = format!("https://www.chitai-gorod.ru{href}");
                driver.on_navigate(&url, MockAction::Replace(heading.clone(), vec![MockElement::new(*page_heading)]));
            }
        }

        #[tokio::test]
        async fn test_all_titles_match() {
            let (driver, base) = mock_page();
            wire_products(&driver, &[
                ("/product/diablo-1", " Diablo IV 16+ ", "Diablo IV (подарочное издание)"),
                ("/product/warcraft-2", "Warcraft", "WARCRAFT"),
            ]);
            let search = SearchPage::new(base, RetryPolicy::default(), Arc::new(NullSink));
            let report = search.compare_search_and_product_titles(5).await.unwrap();
            assert_eq!(report.checks.len(), 2);
            assert!(report.is_consistent());
            assert_eq!(report.checks[0].url, "https://www.chitai-gorod.ru/product/diablo-1");
            assert_eq!(report.checks[0].search_title, "Diablo IV 16+");
        }

        #[tokio::test]
        async fn test_mismatch_is_reported_not_raised() {
            let (driver, base) = mock_page();
            wire_products(&driver, &[
                ("/product/a", "Diablo", "Diablo"),
                ("/product/b", "Warcraft", "StarCraft"),
                ("/product/c", "Ведьмак", "Ведьмак"),
            ]);
            let sink = Arc::new(MemorySink::new());
            let search = SearchPage::new(base, RetryPolicy::default(), sink.clone());
            let report = search.compare_search_and_product_titles(2).await.unwrap();
            assert_eq!(report.checks.len(), 2);
            assert_eq!(report.mismatches().len(), 1);
            assert!(report.ensure_consistent().unwrap_err().to_string().contains("StarCraft"));
            assert_eq!(sink.attachments().last().unwrap().name, "title comparison");
        }
    }

    #[test]
    fn test_resolve_relative_href() {
        assert_eq!(
            resolve("https://www.chitai-gorod.ru/search?phrase=x", "/product/1").unwrap(),
            "https://www.chitai-gorod.ru/product/1"
        );
        assert_eq!(
            resolve("https://www.chitai-gorod.ru/", "https://other.ru/p").unwrap(),
            "https://other.ru/p"
        );
    }
}
