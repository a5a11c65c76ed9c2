//! Static test data (credentials, tokens) loaded from JSON.

use crate::result::{ProbeError, ProbeResult};
use serde_json::Value;
use std::path::Path;

/// Default location of the test data file
pub const DEFAULT_DATA_PATH: &str = "testdata/test_data.json";

/// Untyped access to the test data document
#[derive(Debug, Clone)]
pub struct DataProvider {
    document: Value,
}

impl DataProvider {
    /// Load the data file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ProbeError::DataError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::parse(&text)
    }

    /// Parse a JSON document
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON
    pub fn parse(text: &str) -> ProbeResult<Self> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    /// Wrap an already-parsed document
    #[must_use]
    pub const fn from_value(document: Value) -> Self {
        Self { document }
    }

    /// Top-level value for `key`, `None` if absent
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Top-level string value for `key`
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn require_str(&self, key: &str) -> ProbeResult<String> {
        self.get_str(key)
            .map(str::to_string)
            .ok_or_else(|| ProbeError::DataError {
                message: format!("missing string field {key:?}"),
            })
    }
}

/// Account used by the API client and the login flow
#[derive(Clone, PartialEq, Eq)]
pub struct TestData {
    /// Bearer token sent as `Authorization`
    pub token: String,
    /// Phone number typed into the login form
    pub phone: String,
    /// Name shown in the header once logged in
    pub username: String,
}

impl std::fmt::Debug for TestData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestData")
            .field("token", &"<redacted>")
            .field("phone", &self.phone)
            .field("username", &self.username)
            .finish()
    }
}

impl TestData {
    /// Load typed test data from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or a field is missing
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        Self::from_provider(&DataProvider::from_path(path)?)
    }

    /// Extract typed fields from a provider
    ///
    /// # Errors
    ///
    /// Returns an error if `token`, `phone` or `username` is missing
    pub fn from_provider(data: &DataProvider) -> ProbeResult<Self> {
        Ok(Self {
            token: data.require_str("token")?,
            phone: data.require_str("phone")?,
            username: data.require_str("username")?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataProvider {
        DataProvider::from_value(json!({
            "token": "Bearer abc",
            "phone": "9990001122",
            "username": "Ирина",
            "extra": {"nested": [1, 2]}
        }))
    }

    #[test]
    fn test_get_known_and_unknown_keys() {
        let data = sample();
        assert_eq!(data.get_str("phone"), Some("9990001122"));
        assert_eq!(data.get("extra").unwrap()["nested"][1], 2);
        assert!(data.get("password").is_none());
    }

    #[test]
    fn test_typed_data() {
        let typed = TestData::from_provider(&sample()).unwrap();
        assert_eq!(typed.username, "Ирина");
        assert!(!format!("{typed:?}").contains("abc"));
    }

    #[test]
    fn test_typed_data_missing_field() {
        let data = DataProvider::from_value(json!({"token": "t"}));
        let err = TestData::from_provider(&data).unwrap_err();
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_data.json");
        std::fs::write(&path, r#"{"token":"t","phone":"p","username":"u"}"#).unwrap();
        let typed = TestData::load(&path).unwrap();
        assert_eq!(typed.phone, "p");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            DataProvider::parse("{token:").unwrap_err(),
            ProbeError::Json(_)
        ));
    }
}
