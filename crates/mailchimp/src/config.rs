//! Mailchimp configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MAILCHIMP_API_KEY` - Mailchimp API key, ending in its data-center suffix (e.g. `-us6`)
//!
//! ## Optional
//! - `MAILCHIMP_BASE_URL` - API base URL (default: `https://<dc>.api.mailchimp.com/3.0`)
//! - `MAILCHIMP_MAX_RETRIES` - Rate-limit retry budget per fetch (default: 3)
//! - `MAILCHIMP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::fetch::DEFAULT_MAX_RETRIES;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Mailchimp API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct MailchimpConfig {
    /// Mailchimp API key, sent as a bearer credential
    pub api_key: SecretString,
    /// Data center the account lives in (e.g. `us6`)
    pub data_center: String,
    /// API base URL without trailing slash
    pub base_url: String,
    /// Rate-limit retry budget per top-level fetch
    pub max_retries: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for MailchimpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpConfig")
            .field("api_key", &"[REDACTED]")
            .field("data_center", &self.data_center)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MailchimpConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API key is missing, has no data-center
    /// suffix, looks like a placeholder, or if an optional value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = get_required_env("MAILCHIMP_API_KEY")?;
        let mut config = Self::from_api_key(api_key)?;

        if let Some(base_url) = get_optional_env("MAILCHIMP_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(max_retries) = get_optional_env("MAILCHIMP_MAX_RETRIES") {
            config.max_retries = max_retries.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("MAILCHIMP_MAX_RETRIES".to_string(), e.to_string())
            })?;
        }
        if let Some(timeout) = get_optional_env("MAILCHIMP_TIMEOUT_SECS") {
            let secs: u64 = timeout.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("MAILCHIMP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Build a configuration from an API key with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key has no data-center suffix or looks
    /// like a placeholder.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let (secret, data_center) = split_data_center(&api_key)?;
        validate_not_placeholder(secret, "MAILCHIMP_API_KEY")?;

        let data_center = data_center.to_string();
        Ok(Self {
            base_url: default_base_url(&data_center),
            data_center,
            api_key: SecretString::from(api_key),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Point the client at a different base URL (proxy or test server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the rate-limit retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Bearer credential for the `Authorization` header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }
}

/// Versioned API root for a data center.
fn default_base_url(data_center: &str) -> String {
    format!("https://{data_center}.api.mailchimp.com/3.0")
}

/// Split an API key into its secret part and the data center after the last hyphen.
fn split_data_center(api_key: &str) -> Result<(&str, &str), ConfigError> {
    match api_key.rsplit_once('-') {
        Some((secret, dc)) if !secret.is_empty() && !dc.is_empty() => Ok((secret, dc)),
        _ => Err(ConfigError::InvalidEnvVar(
            "MAILCHIMP_API_KEY".to_string(),
            "must end with a data-center suffix such as -us6".to_string(),
        )),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Reject secrets that look like a template placeholder.
fn validate_not_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "3f9a1c7e5b2d4086af1e9c3b7d5a2e48-us6";

    #[test]
    fn test_data_center_from_key_suffix() {
        let config = MailchimpConfig::from_api_key(TEST_KEY).unwrap();

        assert_eq!(config.data_center, "us6");
        assert_eq!(config.base_url, "https://us6.api.mailchimp.com/3.0");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_data_center_uses_last_hyphen() {
        let (secret, dc) = split_data_center("abc-def-us21").unwrap();
        assert_eq!(secret, "abc-def");
        assert_eq!(dc, "us21");
    }

    #[test]
    fn test_key_without_suffix_rejected() {
        let result = MailchimpConfig::from_api_key("3f9a1c7e5b2d4086af1e9c3b7d5a2e48");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = MailchimpConfig::from_api_key("3f9a1c7e5b2d4086af1e9c3b7d5a2e48-");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let result = MailchimpConfig::from_api_key("your-api-key-us6");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_genuine_key_with_repeated_digits_accepted() {
        // Random hex keys can be skewed toward a few characters
        let config = MailchimpConfig::from_api_key("0ac414f5c500bd6cdaf5ac6860aa8a5f-us6").unwrap();
        assert_eq!(config.data_center, "us6");
    }

    #[test]
    fn test_placeholder_patterns_rejected_case_insensitively() {
        for key in ["CHANGEME-us6", "Replace-Me-us6", "xxxxxxxx-us6"] {
            let result = MailchimpConfig::from_api_key(key);
            assert!(
                matches!(result, Err(ConfigError::InsecureSecret(_, _))),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let config = MailchimpConfig::from_api_key(TEST_KEY)
            .unwrap()
            .with_base_url("http://127.0.0.1:8080/3.0/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080/3.0");
    }

    #[test]
    fn test_bearer_header_value() {
        let config = MailchimpConfig::from_api_key(TEST_KEY).unwrap();
        assert_eq!(config.bearer(), format!("Bearer {TEST_KEY}"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = MailchimpConfig::from_api_key(TEST_KEY).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("us6"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("3f9a1c7e5b2d4086af1e9c3b7d5a2e48"));
    }
}
