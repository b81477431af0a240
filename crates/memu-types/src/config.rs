//! Client configuration types.
//!
//! [`ClientConfig`] is built once and never mutated. Defaults live in named
//! constants so that callers (and the config loader in `memu-infra`) see the
//! same values.

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::MemuError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.memu.so";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of attempts for a single logical request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between task status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default bound on a whole memorize-and-wait polling session.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("memu-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// A MemU API key.
///
/// Always non-empty and trimmed. The value is held in a [`SecretString`] and
/// is only exposed when the transport builds its `Authorization` header.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Validate and wrap an API key. Surrounding whitespace is removed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, MemuError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MemuError::InvalidArgument("API key is required".to_string()));
        }
        Ok(Self(SecretString::from(trimmed.to_string())))
    }

    /// The raw key. Only call this when building request headers.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Strip every trailing `/` from a base URL.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Immutable configuration for a MemU client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: ApiKey,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default base URL, timeout and retry count.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, MemuError> {
        Ok(Self {
            api_key: ApiKey::new(api_key)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: USER_AGENT.to_string(),
        })
    }

    /// Override the base URL. Trailing slashes are stripped.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the attempt bound. At least one attempt is always required.
    pub fn with_max_retries(mut self, max_retries: u32) -> Result<Self, MemuError> {
        if max_retries == 0 {
            return Err(MemuError::InvalidArgument(
                "max_retries must be at least 1".to_string(),
            ));
        }
        self.max_retries = max_retries;
        Ok(self)
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_trimmed() {
        let key = ApiKey::new("  test_key  ").unwrap();
        assert_eq!(key.expose(), "test_key");
    }

    #[test]
    fn test_api_key_rejects_empty_and_blank() {
        for raw in ["", "   ", "\t\n"] {
            let err = ApiKey::new(raw).unwrap_err();
            assert!(matches!(err, MemuError::InvalidArgument(_)));
            assert!(err.to_string().contains("API key is required"));
        }
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-very-secret").unwrap();
        let shown = format!("{key:?}");
        assert!(!shown.contains("sk-very-secret"));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("test_key").unwrap();
        assert_eq!(config.base_url(), "https://api.memu.so");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries(), 3);
        assert!(config.user_agent().starts_with("memu-rust-sdk/"));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = ClientConfig::new("k")
            .unwrap()
            .with_base_url("https://api.example.com/");
        assert_eq!(config.base_url(), "https://api.example.com");

        let config = ClientConfig::new("k").unwrap().with_base_url("https://x");
        assert_eq!(config.base_url(), "https://x");

        assert_eq!(normalize_base_url("https://x///"), "https://x");
    }

    #[test]
    fn test_zero_max_retries_rejected() {
        let err = ClientConfig::new("k").unwrap().with_max_retries(0).unwrap_err();
        assert!(matches!(err, MemuError::InvalidArgument(_)));
    }
}
