//! Run Configuration
//!
//! Sectioned key/value configuration loaded once from a TOML file and
//! handed to every component that needs it. Nothing here is global: the
//! caller builds a [`ConfigProvider`], derives [`Settings`] from it and
//! passes those along.
//!
//! ```toml
//! [api]
//! cart_url = "https://web-gate.chitai-gorod.ru/api/v1/cart"
//! request_delay = 2
//!
//! [ui]
//! base_url = "https://www.chitai-gorod.ru/"
//! browser_name = "chrome"
//! timeout = 4
//! ```

use crate::result::{ProbeError, ProbeResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/test_config.toml";

/// Listing used to pick a random in-stock product
pub const DEFAULT_TOP_PRODUCTS_URL: &str = "https://web-gate.chitai-gorod.ru/api/v2/products-top";

// =============================================================================
// CONFIG PROVIDER
// =============================================================================

/// Read-only view over a sectioned configuration document
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    source: String,
    document: toml::Table,
}

impl ConfigProvider {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_path(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut provider = Self::parse(&text)?;
        provider.source = path.display().to_string();
        Ok(provider)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML
    pub fn parse(text: &str) -> ProbeResult<Self> {
        let document: toml::Table = text.parse()?;
        Ok(Self {
            source: "<inline>".to_string(),
            document,
        })
    }

    /// Where this configuration was loaded from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Look up `key` in `section` as a string.
    ///
    /// Scalars are rendered with their TOML spelling, so `timeout = 4`
    /// reads back as `"4"`. A missing key yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if `section` does not exist or the value is a table/array
    pub fn get(&self, section: &str, key: &str) -> ProbeResult<Option<String>> {
        let table = self.section(section)?;
        match table.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(toml::Value::Float(f)) => Ok(Some(f.to_string())),
            Some(toml::Value::Boolean(b)) => Ok(Some(b.to_string())),
            Some(toml::Value::Datetime(d)) => Ok(Some(d.to_string())),
            Some(other) => Err(ProbeError::config(format!(
                "[{section}] {key} is a {}, expected a scalar",
                other.type_str()
            ))),
        }
    }

    /// Look up `key` in `section` as an integer
    ///
    /// # Errors
    ///
    /// Returns an error if the section or key is missing or the value is not an integer
    pub fn get_int(&self, section: &str, key: &str) -> ProbeResult<i64> {
        let table = self.section(section)?;
        match table.get(key) {
            Some(toml::Value::Integer(i)) => Ok(*i),
            Some(toml::Value::String(s)) => s.trim().parse().map_err(|_| {
                ProbeError::config(format!("[{section}] {key} = {s:?} is not an integer"))
            }),
            Some(other) => Err(ProbeError::config(format!(
                "[{section}] {key} is a {}, expected an integer",
                other.type_str()
            ))),
            None => Err(ProbeError::config(format!("[{section}] {key} is not set"))),
        }
    }

    /// Look up a required string value
    ///
    /// # Errors
    ///
    /// Returns an error if the section or key is missing
    pub fn require(&self, section: &str, key: &str) -> ProbeResult<String> {
        self.get(section, key)?
            .ok_or_else(|| ProbeError::config(format!("[{section}] {key} is not set")))
    }

    fn section(&self, section: &str) -> ProbeResult<&toml::Table> {
        match self.document.get(section) {
            Some(toml::Value::Table(table)) => Ok(table),
            Some(_) => Err(ProbeError::config(format!(
                "[{section}] in {} is not a section",
                self.source
            ))),
            None => Err(ProbeError::config(format!(
                "no section [{section}] in {}",
                self.source
            ))),
        }
    }
}

// =============================================================================
// TYPED SETTINGS
// =============================================================================

/// Browser family named by `ui.browser_name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    /// Chrome or Chromium, driven over CDP
    Chromium,
    /// Firefox (recognised, but no driver is available)
    Firefox,
}

impl BrowserKind {
    /// Parse a configured browser name
    ///
    /// # Errors
    ///
    /// Returns an error for names other than chrome, chromium or firefox
    pub fn parse(name: &str) -> ProbeResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            other => Err(ProbeError::config(format!(
                "unknown browser_name {other:?} (expected chrome, chromium or firefox)"
            ))),
        }
    }

    /// Configuration spelling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base cart endpoint
    pub cart_url: String,
    /// Pause after each API test group
    pub request_delay: Duration,
    /// Product listing used for random product ids
    pub top_products_url: String,
}

/// `[ui]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    /// Storefront entry URL
    pub base_url: String,
    /// Browser to launch
    pub browser: BrowserKind,
    /// Implicit wait applied to element lookups
    pub timeout: Duration,
    /// Run without a visible window
    pub headless: bool,
    /// Window width in pixels
    pub window_width: u32,
    /// Window height in pixels
    pub window_height: u32,
    /// Explicit browser executable
    pub chromium_path: Option<PathBuf>,
}

/// Typed run settings, built once and injected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Cart API settings
    pub api: ApiSettings,
    /// Browser settings
    pub ui: UiSettings,
}

impl Settings {
    /// Load and validate settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or a required key is missing
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        Self::from_provider(&ConfigProvider::from_path(path)?)
    }

    /// Build settings from an already-loaded provider
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or mistyped
    pub fn from_provider(config: &ConfigProvider) -> ProbeResult<Self> {
        let api = ApiSettings {
            cart_url: config.require("api", "cart_url")?,
            request_delay: Duration::from_secs(non_negative(
                config.get_int("api", "request_delay")?,
                "api.request_delay",
            )?),
            top_products_url: config
                .get("api", "top_products_url")?
                .unwrap_or_else(|| DEFAULT_TOP_PRODUCTS_URL.to_string()),
        };

        let headless = match config.get("ui", "headless")? {
            Some(v) => v.parse().map_err(|_| {
                ProbeError::config(format!("ui.headless = {v:?} is not a boolean"))
            })?,
            None => false,
        };

        let ui = UiSettings {
            base_url: config.require("ui", "base_url")?,
            browser: BrowserKind::parse(&config.require("ui", "browser_name")?)?,
            timeout: Duration::from_secs(non_negative(
                config.get_int("ui", "timeout")?,
                "ui.timeout",
            )?),
            headless,
            window_width: optional_u32(config, "window_width", 1920)?,
            window_height: optional_u32(config, "window_height", 1080)?,
            chromium_path: config.get("ui", "chromium_path")?.map(PathBuf::from),
        };

        Ok(Self { api, ui })
    }
}

fn non_negative(value: i64, what: &str) -> ProbeResult<u64> {
    u64::try_from(value).map_err(|_| ProbeError::config(format!("{what} must be >= 0, got {value}")))
}

fn optional_u32(config: &ConfigProvider, key: &str, default: u32) -> ProbeResult<u32> {
    if config.get("ui", key)?.is_none() {
        return Ok(default);
    }
    let value = config.get_int("ui", key)?;
    u32::try_from(value).map_err(|_| ProbeError::config(format!("ui.{key} out of range: {value}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[api]
cart_url = "https://web-gate.chitai-gorod.ru/api/v1/cart"
request_delay = 2

[ui]
base_url = "https://www.chitai-gorod.ru/"
browser_name = "chrome"
timeout = 4
"#;

    mod provider_tests {
        use super::*;

        #[test]
        fn test_get_existing_values() {
            let config = ConfigProvider::parse(SAMPLE).unwrap();
            assert_eq!(
                config.get("ui", "browser_name").unwrap().as_deref(),
                Some("chrome")
            );
            assert_eq!(config.get("ui", "timeout").unwrap().as_deref(), Some("4"));
            assert_eq!(config.get_int("api", "request_delay").unwrap(), 2);
        }

        #[test]
        fn test_missing_key_is_none() {
            let config = ConfigProvider::parse(SAMPLE).unwrap();
            assert!(config.get("ui", "nope").unwrap().is_none());
        }

        #[test]
        fn test_missing_section_is_error() {
            let config = ConfigProvider::parse(SAMPLE).unwrap();
            let err = config.get("db", "host").unwrap_err();
            assert!(err.to_string().contains("no section [db]"));
        }

        #[test]
        fn test_get_int_rejects_text() {
            let config = ConfigProvider::parse("[ui]\ntimeout = \"soon\"\n").unwrap();
            assert!(config.get_int("ui", "timeout").is_err());
        }

        #[test]
        fn test_get_int_accepts_numeric_string() {
            let config = ConfigProvider::parse("[ui]\ntimeout = \" 7 \"\n").unwrap();
            assert_eq!(config.get_int("ui", "timeout").unwrap(), 7);
        }

        #[test]
        fn test_get_int_missing_key() {
            let config = ConfigProvider::parse(SAMPLE).unwrap();
            assert!(config.get_int("api", "retries").is_err());
        }

        #[test]
        fn test_from_path() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(SAMPLE.as_bytes()).unwrap();
            let config = ConfigProvider::from_path(file.path()).unwrap();
            assert!(config.source().ends_with(
                file.path().file_name().unwrap().to_str().unwrap()
            ));
        }

        #[test]
        fn test_from_missing_path() {
            let err = ConfigProvider::from_path("/nonexistent/test_config.toml").unwrap_err();
            assert!(matches!(err, ProbeError::ConfigError { .. }));
        }

        #[test]
        fn test_invalid_toml() {
            assert!(matches!(
                ConfigProvider::parse("[api\ncart_url = 1").unwrap_err(),
                ProbeError::Toml(_)
            ));
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_settings_from_sample() {
            let settings = Settings::from_provider(&ConfigProvider::parse(SAMPLE).unwrap()).unwrap();
            assert_eq!(settings.api.request_delay, Duration::from_secs(2));
            assert_eq!(settings.api.top_products_url, DEFAULT_TOP_PRODUCTS_URL);
            assert_eq!(settings.ui.browser, BrowserKind::Chromium);
            assert_eq!(settings.ui.timeout, Duration::from_secs(4));
            assert!(!settings.ui.headless);
            assert_eq!(settings.ui.window_width, 1920);
            assert!(settings.ui.chromium_path.is_none());
        }

        #[test]
        fn test_settings_optional_overrides() {
            let text = format!(
                "{SAMPLE}headless = true\nwindow_width = 1280\nchromium_path = \"/usr/bin/chromium\"\n"
            );
            let settings = Settings::from_provider(&ConfigProvider::parse(&text).unwrap()).unwrap();
            assert!(settings.ui.headless);
            assert_eq!(settings.ui.window_width, 1280);
            assert_eq!(
                settings.ui.chromium_path,
                Some(PathBuf::from("/usr/bin/chromium"))
            );
        }

        #[test]
        fn test_settings_missing_required_key() {
            let text = SAMPLE.replace("cart_url", "basket_url");
            let err = Settings::from_provider(&ConfigProvider::parse(&text).unwrap()).unwrap_err();
            assert!(err.to_string().contains("cart_url"));
        }

        #[test]
        fn test_negative_delay_rejected() {
            let text = SAMPLE.replace("request_delay = 2", "request_delay = -1");
            assert!(Settings::from_provider(&ConfigProvider::parse(&text).unwrap()).is_err());
        }

        #[test]
        fn test_browser_kind_parse() {
            assert_eq!(BrowserKind::parse("Chrome").unwrap(), BrowserKind::Chromium);
            assert_eq!(BrowserKind::parse("firefox").unwrap(), BrowserKind::Firefox);
            assert!(BrowserKind::parse("lynx").is_err());
        }
    }
}
