//! Element selectors and the JavaScript used to resolve them.
//!
//! Page objects describe elements with [`Selector`] values; drivers turn
//! them into DOM queries with [`Selector::to_all_query`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.header-controls__btn")
    Css(String),
    /// XPath selector
    XPath(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Raw selector text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// Expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({})", js_string(s)),
            Self::XPath(s) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(s)
            ),
        }
    }

    /// Expression evaluating to an array of all matches
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); return out; }})()",
                js_string(s)
            ),
        }
    }

    /// Expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({}).length", js_string(s)),
            Self::XPath(s) => format!(
                "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                js_string(s)
            ),
        }
    }

    /// Wrap `body` (which sees the first match as `el`) in a null-safe IIFE
    #[must_use]
    pub fn with_first(&self, body: &str) -> String {
        format!("(() => {{ const el = {}; if (!el) return null; {body} }})()", self.to_query())
    }

    /// Wrap `body` (which sees the match list as `els`) in an IIFE
    #[must_use]
    pub fn with_all(&self, body: &str) -> String {
        format!("(() => {{ const els = {}; {body} }})()", self.to_all_query())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Quote `s` as a JavaScript string literal
#[must_use]
pub fn js_string(s: &str) -> String {
    // JSON string syntax is a subset of JS string syntax
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_css_query() {
        let sel = Selector::css("button[aria-label='Корзина']");
        assert_eq!(
            sel.to_query(),
            r#"document.querySelector("button[aria-label='Корзина']")"#
        );
        assert!(sel.to_count_query().ends_with(".length"));
    }

    #[test]
    fn test_xpath_query_keeps_quotes_intact() {
        let sel = Selector::xpath("//*[text()='Войти']");
        let q = sel.to_query();
        assert!(q.starts_with("document.evaluate(\"//*[text()='Войти']\""));
        assert!(q.contains("FIRST_ORDERED_NODE_TYPE"));
        assert!(sel.to_all_query().contains("snapshotItem"));
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_with_first_is_null_safe() {
        let js = Selector::css("#tid-input").with_first("return el.value;");
        assert!(js.contains("if (!el) return null;"));
        assert!(js.ends_with("return el.value; })()"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Selector::css("a").to_string(), "css=a");
        assert_eq!(Selector::xpath("//a").as_str(), "//a");
    }
}
