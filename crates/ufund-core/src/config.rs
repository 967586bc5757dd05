//! Workspace configuration
//!
//! Loaded from TOML, with the backend URL overridable through
//! `UFUND_API_URL`:
//!
//! ```toml
//! admin_user_name = "admin"
//!
//! [client]
//! base_url = "http://localhost:8080"
//! timeout_secs = 30
//!
//! [write_retry]
//! max_attempts = 3
//! backoff_ms = 200
//! ```

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use ufund_client::ClientConfig;
use ufund_model::ADMIN_USER_NAME;

/// Environment variable overriding `client.base_url`
pub const API_URL_ENV: &str = "UFUND_API_URL";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UfundConfig {
    /// Backend connection
    pub client: ClientConfig,
    /// Retry policy for write-behind remote writes
    pub write_retry: RetryPolicy,
    /// Account treated as the cupboard manager
    pub admin_user_name: String,
}

impl UfundConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client.base_url = base_url.into();
        self
    }

    /// With write retry policy
    #[inline]
    #[must_use]
    pub fn with_write_retry(mut self, policy: RetryPolicy) -> Self {
        self.write_retry = policy;
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// `CoreError::Config` if the document is malformed
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        toml::from_str(raw).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `CoreError::Config` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            tracing::debug!(base_url = %url, "backend url overridden from environment");
            self.client.base_url = url;
        }
        self
    }
}

impl Default for UfundConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            write_retry: RetryPolicy::default(),
            admin_user_name: ADMIN_USER_NAME.to_string(),
        }
    }
}

/// Retry policy for remote writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per write, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly
    pub backoff_ms: u64,
}

impl RetryPolicy {
    /// Single attempt, no retry
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    #[inline]
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_defaults() {
        let config = UfundConfig::new();
        assert_eq!(config.client.base_url, "http://localhost:8080");
        assert_eq!(config.admin_user_name, "admin");
        assert_eq!(config.write_retry.max_attempts, 3);
    }

    #[test]
    fn config_partial_toml() {
        let config = UfundConfig::from_toml_str(
            r#"
            [client]
            base_url = "http://cupboard.test"

            [write_retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.client.base_url, "http://cupboard.test");
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.write_retry.max_attempts, 5);
        assert_eq!(config.write_retry.backoff_ms, 200);
    }

    #[test]
    fn config_malformed_toml() {
        let err = UfundConfig::from_toml_str("client = 3").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn config_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin_user_name = \"root\"").unwrap();

        let config = UfundConfig::load(file.path()).unwrap();
        assert_eq!(config.admin_user_name, "root");

        let missing = UfundConfig::load(Path::new("/nonexistent/ufund.toml"));
        assert!(matches!(missing, Err(CoreError::Config(_))));
    }

    #[test]
    fn env_override_replaces_base_url() {
        let config = UfundConfig::new().with_overrides_from(|key| {
            (key == API_URL_ENV).then(|| "http://override.test".to_string())
        });
        assert_eq!(config.client.base_url, "http://override.test");

        let config = UfundConfig::new().with_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(config.client.base_url, "http://localhost:8080");
    }

    #[test]
    fn retry_delay_is_linear() {
        let policy = RetryPolicy {
            max_attempts: 4,
            backoff_ms: 50,
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(50));
        assert_eq!(policy.delay_after(3), Duration::from_millis(150));
        assert_eq!(RetryPolicy::none().delay_after(2), Duration::ZERO);
    }
}
