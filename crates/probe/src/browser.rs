//! Browser Launch
//!
//! With the `browser` feature the storefront is driven over CDP through
//! chromiumoxide. Element queries run as injected JavaScript built from
//! [`Selector`]; clicks and keystrokes go through native input events.

use crate::config::{BrowserKind, UiSettings};
use crate::driver::SharedDriver;
use crate::result::{ProbeError, ProbeResult};

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use crate::config::UiSettings;
    use crate::driver::{Cookie, PageDriver};
    use crate::locator::{js_string, Selector};
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::network::{ClearBrowserCookiesParams, CookieParam};
    use chromiumoxide::element::Element;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn page_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::PageError {
            message: e.to_string(),
        }
    }

    /// Chromium session with a single page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        page: CdpPage,
        browser: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(ui: &UiSettings) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder().window_size(ui.window_width, ui.window_height);

            if !ui.headless {
                builder = builder.with_head();
            }

            if let Some(ref path) = ui.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser.new_page("about:blank").await.map_err(page_error)?;
            tracing::info!(
                width = ui.window_width,
                height = ui.window_height,
                headless = ui.headless,
                "chromium launched"
            );

            Ok(Self {
                page,
                browser: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        async fn eval<T: DeserializeOwned>(&self, expr: String) -> ProbeResult<T> {
            let result = self.page.evaluate(expr).await.map_err(page_error)?;
            // JS null comes back without a value
            let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
            serde_json::from_value(value).map_err(page_error)
        }

        async fn element(&self, selector: &Selector) -> ProbeResult<Element> {
            let found = match selector {
                Selector::Css(css) => self.page.find_element(css.as_str()).await,
                Selector::XPath(xpath) => self.page.find_xpath(xpath.as_str()).await,
            };
            found.map_err(|e| page_error(format!("{selector}: {e}")))
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> ProbeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            Ok(self
                .page
                .url()
                .await
                .map_err(page_error)?
                .unwrap_or_default())
        }

        async fn reload(&self) -> ProbeResult<()> {
            self.page.reload().await.map_err(page_error)?;
            Ok(())
        }

        async fn count(&self, selector: &Selector) -> ProbeResult<usize> {
            self.eval(selector.to_count_query()).await
        }

        async fn is_visible(&self, selector: &Selector) -> ProbeResult<bool> {
            let visible: Option<bool> = self
                .eval(selector.with_first(
                    "const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
                     return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';",
                ))
                .await?;
            Ok(visible.unwrap_or(false))
        }

        async fn is_enabled(&self, selector: &Selector) -> ProbeResult<bool> {
            let enabled: Option<bool> = self.eval(selector.with_first("return !el.disabled;")).await?;
            Ok(enabled.unwrap_or(false))
        }

        async fn text(&self, selector: &Selector) -> ProbeResult<Option<String>> {
            self.eval(selector.with_first("return el.innerText;")).await
        }

        async fn attributes(&self, selector: &Selector, name: &str) -> ProbeResult<Vec<Option<String>>> {
            self.eval(selector.with_all(&format!(
                "return els.map(e => e.getAttribute({}));",
                js_string(name)
            )))
            .await
        }

        async fn input_value(&self, selector: &Selector) -> ProbeResult<Option<String>> {
            self.eval(selector.with_first("return el.value ?? null;")).await
        }

        async fn click(&self, selector: &Selector) -> ProbeResult<()> {
            self.element(selector).await?.click().await.map_err(page_error)?;
            Ok(())
        }

        async fn script_click(&self, selector: &Selector, index: usize) -> ProbeResult<()> {
            let clicked: bool = self
                .eval(selector.with_all(&format!(
                    "const el = els[{index}]; if (!el) return false; el.click(); return true;"
                )))
                .await?;
            if clicked {
                Ok(())
            } else {
                Err(page_error(format!("no element #{index} for {selector}")))
            }
        }

        async fn clear(&self, selector: &Selector) -> ProbeResult<()> {
            let _: Option<bool> = self
                .eval(selector.with_first(
                    "el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return true;",
                ))
                .await?;
            Ok(())
        }

        async fn select_all_and_delete(&self, selector: &Selector) -> ProbeResult<()> {
            let element = self.element(selector).await?;
            element.focus().await.map_err(page_error)?;
            let _: Option<bool> = self
                .eval(selector.with_first("if (el.select) el.select(); return true;"))
                .await?;
            element.press_key("Backspace").await.map_err(page_error)?;
            Ok(())
        }

        async fn type_text(&self, selector: &Selector, text: &str) -> ProbeResult<()> {
            let element = self.element(selector).await?;
            element.focus().await.map_err(page_error)?;
            element.type_str(text).await.map_err(page_error)?;
            Ok(())
        }

        async fn press_enter(&self, selector: &Selector) -> ProbeResult<()> {
            self.element(selector)
                .await?
                .press_key("Enter")
                .await
                .map_err(page_error)?;
            Ok(())
        }

        async fn set_cookie(&self, cookie: &Cookie) -> ProbeResult<()> {
            let param = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .build()
                .map_err(page_error)?;
            self.page.set_cookie(param).await.map_err(page_error)?;
            Ok(())
        }

        async fn delete_all_cookies(&self) -> ProbeResult<()> {
            self.page
                .execute(ClearBrowserCookiesParams::default())
                .await
                .map_err(page_error)?;
            Ok(())
        }

        async fn close(&self) -> ProbeResult<()> {
            let mut browser = self.browser.lock().await;
            let closed = browser.close().await;
            self.handle.abort();
            closed.map_err(|e| ProbeError::BrowserLaunchError {
                message: e.to_string(),
            })?;
            tracing::info!("chromium closed");
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

/// Launch the browser named in `ui` and wrap it as a shared driver
///
/// # Errors
///
/// [`ProbeError::UnsupportedBrowser`] for Firefox, or a launch error.
pub async fn launch(ui: &UiSettings) -> ProbeResult<SharedDriver> {
    match ui.browser {
        BrowserKind::Chromium => launch_chromium(ui).await,
        BrowserKind::Firefox => Err(ProbeError::UnsupportedBrowser {
            name: ui.browser.as_str().to_string(),
        }),
    }
}

#[cfg(feature = "browser")]
async fn launch_chromium(ui: &UiSettings) -> ProbeResult<SharedDriver> {
    Ok(std::sync::Arc::new(ChromiumDriver::launch(ui).await?))
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn launch_chromium(_ui: &UiSettings) -> ProbeResult<SharedDriver> {
    Err(ProbeError::BrowserLaunchError {
        message: "Browser feature not enabled. Enable 'browser' feature for real CDP support."
            .to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ui(browser: BrowserKind) -> UiSettings {
        UiSettings {
            base_url: "https://www.chitai-gorod.ru/".to_string(),
            browser,
            timeout: Duration::from_secs(4),
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
        }
    }

    #[tokio::test]
    async fn test_firefox_is_unsupported() {
        let err = launch(&ui(BrowserKind::Firefox)).await.unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedBrowser { ref name } if name == "firefox"));
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_launch_without_feature_fails() {
        let err = launch(&ui(BrowserKind::Chromium)).await.unwrap_err();
        assert!(matches!(err, ProbeError::BrowserLaunchError { .. }));
    }
}
