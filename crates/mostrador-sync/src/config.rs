//! # Sync Configuration
//!
//! Builder-style configuration for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MOSTRADOR_API_URL=https://api.example.com                          │
//! │     MOSTRADOR_API_KEY=...                                              │
//! │                                                                         │
//! │  2. Builder values set by the host application                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     30s sync interval, 10s recount interval, 500-row pull pages        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// Complete sync engine configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = SyncConfig::new("https://api.example.com")
///     .api_key("secret")
///     .sync_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote API (no trailing slash).
    pub base_url: String,

    /// Bearer token for the remote API, if required.
    pub api_key: Option<String>,

    /// Tenant this device belongs to.
    pub tenant_id: String,

    /// Location (branch) this device sells from.
    pub location_id: String,

    /// Interval between automatic sync cycles.
    pub sync_interval: Duration,

    /// Interval between pending-count refreshes (cheap, local-only).
    pub recount_interval: Duration,

    /// Maximum rows per pull page.
    pub pull_page_size: u32,

    /// Timeout for each HTTP request.
    pub http_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with defaults for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        SyncConfig {
            base_url: base_url.into(),
            api_key: None,
            tenant_id: mostrador_core::DEFAULT_TENANT_ID.to_string(),
            location_id: mostrador_core::DEFAULT_LOCATION_ID.to_string(),
            sync_interval: Duration::from_secs(30),
            recount_interval: Duration::from_secs(10),
            pull_page_size: 500,
            http_timeout: Duration::from_secs(15),
        }
    }

    /// Sets the API bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the tenant id.
    pub fn tenant_id(mut self, id: impl Into<String>) -> Self {
        self.tenant_id = id.into();
        self
    }

    /// Sets the location id.
    pub fn location_id(mut self, id: impl Into<String>) -> Self {
        self.location_id = id.into();
        self
    }

    /// Sets the automatic sync interval.
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the pending-count refresh interval.
    pub fn recount_interval(mut self, interval: Duration) -> Self {
        self.recount_interval = interval;
        self
    }

    /// Sets the pull page size.
    pub fn pull_page_size(mut self, size: u32) -> Self {
        self.pull_page_size = size;
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("MOSTRADOR_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.base_url = url;
        }
        if let Ok(key) = std::env::var("MOSTRADOR_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("MOSTRADOR_TENANT_ID") {
            self.tenant_id = id;
        }
        if let Ok(id) = std::env::var("MOSTRADOR_LOCATION_ID") {
            self.location_id = id;
        }
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.base_url.is_empty() {
            return Err(SyncError::InvalidConfig("base_url must not be empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SyncError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.pull_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "pull_page_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new("https://api.example.com");
        assert_eq!(config.sync_interval, Duration::from_secs(30));
        assert_eq!(config.pull_page_size, 500);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let config = SyncConfig::new("https://api.example.com")
            .api_key("secret")
            .tenant_id("t-1")
            .location_id("l-1")
            .sync_interval(Duration::from_secs(5));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.tenant_id, "t-1");
        assert_eq!(config.sync_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        assert!(SyncConfig::new("").validate().is_err());
        assert!(SyncConfig::new("ftp://api.example.com").validate().is_err());

        let mut config = SyncConfig::new("https://api.example.com");
        config.pull_page_size = 0;
        assert!(config.validate().is_err());
    }
}
