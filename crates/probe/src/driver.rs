//! PageDriver - Browser Automation Seam
//!
//! Page objects talk to the browser only through [`PageDriver`]. The CDP
//! implementation lives in [`crate::browser`]; [`MockDriver`] is a small
//! scriptable DOM used to test page objects without a browser.
//!
//! All methods take `&self`: one driver is shared by every page object of
//! a session, so implementations use interior mutability.

use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain
    pub domain: String,
    /// Cookie path
    pub path: String,
}

impl Cookie {
    /// Create a cookie scoped to `domain` with path `/`
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
        }
    }

    /// Set the path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// Abstract driver trait for browser automation
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Reload the page
    async fn reload(&self) -> ProbeResult<()>;

    /// Number of elements matching `selector`
    async fn count(&self, selector: &Selector) -> ProbeResult<usize>;

    /// First match exists and is rendered
    async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool>;

    /// First match exists and is not disabled
    async fn is_enabled(&self, selector: &Selector) -> ProbeResult<bool>;

    /// Rendered text of the first match
    async fn text(&self, selector: &Selector) -> ProbeResult<Option<String>>;

    /// Attribute `name` of every match, in document order
    async fn attributes(&self, selector: &Selector, name: &str) -> ProbeResult<Vec<Option<String>>>;

    /// Current `value` of the first matching input
    async fn input_value(&self, selector: &Selector) -> ProbeResult<Option<String>>;

    /// Native click on the first match
    async fn click(&self, selector: &Selector) -> ProbeResult<()>;

    /// DOM `element.click()` on the match at `index`
    async fn script_click(&self, selector: &Selector, index: usize) -> ProbeResult<()>;

    /// Reset the first matching input to empty
    async fn clear(&self, selector: &Selector) -> ProbeResult<()>;

    /// Select everything in the first matching input and delete it
    async fn select_all_and_delete(&self, selector: &Selector) -> ProbeResult<()>;

    /// Type `text` into the first match
    async fn type_text(&self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Press Enter in the first match
    async fn press_enter(&self, selector: &Selector) -> ProbeResult<()>;

    /// Install a cookie
    async fn set_cookie(&self, cookie: &Cookie) -> ProbeResult<()>;

    /// Remove all cookies
    async fn delete_all_cookies(&self) -> ProbeResult<()>;

    /// Close the browser
    async fn close(&self) -> ProbeResult<()>;
}

/// Shared driver handle
pub type SharedDriver = Arc<dyn PageDriver>;

// =============================================================================
// MOCK DRIVER
// =============================================================================

/// Element in the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered text
    pub text: String,
    /// Rendered on screen
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Input value
    pub value: String,
    /// DOM attributes
    pub attributes: HashMap<String, String>,
}

impl MockElement {
    /// Visible, enabled element with `text`
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: true,
            enabled: true,
            value: String::new(),
            attributes: HashMap::new(),
        }
    }

    /// Mark as not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Effect applied to the mock DOM when a hook fires
#[derive(Debug, Clone)]
pub enum MockAction {
    /// Append an element
    Show(Selector, MockElement),
    /// Replace all matches
    Replace(Selector, Vec<MockElement>),
    /// Remove all matches
    Remove(Selector),
    /// Set the text of every match
    SetText(Selector, String),
    /// Treat the first match's text as a counter and add one
    Increment(Selector),
    /// Change the current URL
    SetUrl(String),
}

#[derive(Debug, Default)]
struct MockPage {
    url: String,
    elements: HashMap<String, Vec<MockElement>>,
    hooks: HashMap<String, Vec<MockAction>>,
    cookies: Vec<Cookie>,
    ignored_keystrokes: usize,
    history: Vec<String>,
}

impl MockPage {
    fn first(&self, selector: &Selector) -> Option<&MockElement> {
        self.elements.get(selector.as_str()).and_then(|v| v.first())
    }

    fn first_mut(&mut self, selector: &Selector) -> ProbeResult<&mut MockElement> {
        self.elements
            .get_mut(selector.as_str())
            .and_then(|v| v.first_mut())
            .ok_or_else(|| ProbeError::page(format!("no element matches {selector}")))
    }

    fn fire(&mut self, trigger: &str) {
        let actions = self.hooks.get(trigger).cloned().unwrap_or_default();
        for action in actions {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: MockAction) {
        match action {
            MockAction::Show(sel, el) => {
                self.elements.entry(sel.as_str().to_string()).or_default().push(el);
            }
            MockAction::Replace(sel, els) => {
                let _ = self.elements.insert(sel.as_str().to_string(), els);
            }
            MockAction::Remove(sel) => {
                let _ = self.elements.remove(sel.as_str());
            }
            MockAction::SetText(sel, text) => {
                if let Some(els) = self.elements.get_mut(sel.as_str()) {
                    for el in els {
                        el.text.clone_from(&text);
                    }
                }
            }
            MockAction::Increment(sel) => {
                let els = self.elements.entry(sel.as_str().to_string()).or_default();
                if let Some(el) = els.first_mut() {
                    let n: i64 = el.text.trim().parse().unwrap_or(0);
                    el.text = (n + 1).to_string();
                } else {
                    els.push(MockElement::new("1"));
                }
            }
            MockAction::SetUrl(url) => self.url = url,
        }
    }
}

/// Scriptable in-memory driver for unit tests.
///
/// Elements are keyed by the raw selector text, so a page object finds
/// exactly what was registered under the same selector. Hooks run when an
/// element is clicked, Enter is pressed, or a URL is loaded.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    page: Arc<Mutex<MockPage>>,
}

impl MockDriver {
    /// Create a mock driver at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.with_page(|p| p.url = "about:blank".to_string());
        driver
    }

    fn with_page<T>(&self, f: impl FnOnce(&mut MockPage) -> T) -> T {
        let mut page = match self.page.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut page)
    }

    /// Add an element under `selector`
    pub fn add_element(&self, selector: &Selector, element: MockElement) {
        self.with_page(|p| p.apply(MockAction::Show(selector.clone(), element)));
    }

    /// Set the current URL without firing hooks
    pub fn set_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.with_page(|p| p.url = url);
    }

    /// Run `action` whenever an element matching `selector` is clicked
    pub fn on_click(&self, selector: &Selector, action: MockAction) {
        self.hook(format!("click:{}", selector.as_str()), action);
    }

    /// Run `action` whenever Enter is pressed in `selector`
    pub fn on_enter(&self, selector: &Selector, action: MockAction) {
        self.hook(format!("enter:{}", selector.as_str()), action);
    }

    /// Run `action` whenever `url` is loaded
    pub fn on_navigate(&self, url: &str, action: MockAction) {
        self.hook(format!("navigate:{url}"), action);
    }

    /// Run `action` on every reload
    pub fn on_reload(&self, action: MockAction) {
        self.hook("reload".to_string(), action);
    }

    fn hook(&self, key: String, action: MockAction) {
        self.with_page(|p| p.hooks.entry(key).or_default().push(action));
    }

    /// Swallow the next `n` `type_text` calls (flaky input simulation)
    pub fn ignore_keystrokes(&self, n: usize) {
        self.with_page(|p| p.ignored_keystrokes = n);
    }

    /// Current text of the first match
    #[must_use]
    pub fn element_text(&self, selector: &Selector) -> Option<String> {
        self.with_page(|p| p.first(selector).map(|e| e.text.clone()))
    }

    /// Installed cookies
    #[must_use]
    pub fn cookies(&self) -> Vec<Cookie> {
        self.with_page(|p| p.cookies.clone())
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.with_page(|p| p.history.clone())
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.with_page(|p| p.history.iter().any(|c| c.starts_with(method)))
    }

    /// Number of recorded calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.with_page(|p| p.history.iter().filter(|c| c.starts_with(method)).count())
    }

    fn record(p: &mut MockPage, call: String) {
        p.history.push(call);
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("navigate:{url}"));
            p.url = url.to_string();
            p.fire(&format!("navigate:{url}"));
        });
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.with_page(|p| p.url.clone()))
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, "reload".to_string());
            p.fire("reload");
        });
        Ok(())
    }

    async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
        Ok(self.with_page(|p| p.elements.get(selector.as_str()).map_or(0, Vec::len)))
    }

    async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool> {
        Ok(self.with_page(|p| p.first(selector).is_some_and(|e| e.visible)))
    }

    async fn is_enabled(&self, selector: &Selector) -> ProbeResult<bool> {
        Ok(self.with_page(|p| p.first(selector).is_some_and(|e| e.enabled)))
    }

    async fn text(&self, selector: &Selector) -> ProbeResult<Option<String>> {
        Ok(self.with_page(|p| p.first(selector).map(|e| e.text.clone())))
    }

    async fn attributes(&self, selector: &Selector, name: &str) -> ProbeResult<Vec<Option<String>>> {
        Ok(self.with_page(|p| {
            p.elements
                .get(selector.as_str())
                .map(|els| els.iter().map(|e| e.attributes.get(name).cloned()).collect())
                .unwrap_or_default()
        }))
    }

    async fn input_value(&self, selector: &Selector) -> ProbeResult<Option<String>> {
        Ok(self.with_page(|p| p.first(selector).map(|e| e.value.clone())))
    }

    async fn click(&self, selector: &Selector) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("click:{}", selector.as_str()));
            if p.first(selector).is_none() {
                return Err(ProbeError::page(format!("no element matches {selector}")));
            }
            p.fire(&format!("click:{}", selector.as_str()));
            Ok(())
        })
    }

    async fn script_click(&self, selector: &Selector, index: usize) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("script_click:{}#{index}", selector.as_str()));
            let present = p
                .elements
                .get(selector.as_str())
                .is_some_and(|els| index < els.len());
            if !present {
                return Err(ProbeError::page(format!("no element #{index} for {selector}")));
            }
            p.fire(&format!("click:{}", selector.as_str()));
            Ok(())
        })
    }

    async fn clear(&self, selector: &Selector) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("clear:{}", selector.as_str()));
            p.first_mut(selector)?.value.clear();
            Ok(())
        })
    }

    async fn select_all_and_delete(&self, selector: &Selector) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("select_all_and_delete:{}", selector.as_str()));
            p.first_mut(selector)?.value.clear();
            Ok(())
        })
    }

    async fn type_text(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("type_text:{}={text}", selector.as_str()));
            if p.ignored_keystrokes > 0 {
                p.ignored_keystrokes -= 1;
                return Ok(());
            }
            p.first_mut(selector)?.value.push_str(text);
            Ok(())
        })
    }

    async fn press_enter(&self, selector: &Selector) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("press_enter:{}", selector.as_str()));
            p.fire(&format!("enter:{}", selector.as_str()));
        });
        Ok(())
    }

    async fn set_cookie(&self, cookie: &Cookie) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, format!("set_cookie:{}", cookie.name));
            p.cookies.retain(|c| c.name != cookie.name);
            p.cookies.push(cookie.clone());
        });
        Ok(())
    }

    async fn delete_all_cookies(&self) -> ProbeResult<()> {
        self.with_page(|p| {
            Self::record(p, "delete_all_cookies".to_string());
            p.cookies.clear();
        });
        Ok(())
    }

    async fn close(&self) -> ProbeResult<()> {
        self.with_page(|p| Self::record(p, "close".to_string()));
        Ok(())
    }
}
