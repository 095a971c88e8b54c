//! Configuration for content fetching
//!
//! Defines settings for the page extraction service and the fetch worker pool.

use std::env;

use crate::config::ConfigError;

/// Configuration for content fetching
#[derive(Debug, Clone)]
pub struct ContentFetchConfig {
    /// Jina Reader API key (anonymous, rate-limited access when None)
    pub jina_api_key: Option<String>,
    /// Maximum fetches in flight at once (default: 5)
    pub max_concurrent: usize,
    /// Timeout per page fetch in seconds (default: 30)
    pub timeout_per_page_secs: u64,
}

impl ContentFetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jina_api_key: env::var("JINA_API_KEY").ok().filter(|k| !k.is_empty()),
            max_concurrent: env::var("CONTENT_FETCH_MAX_CONCURRENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent)
                .min(16), // Cap at 16
            timeout_per_page_secs: env::var("CONTENT_FETCH_TIMEOUT_PER_PAGE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_per_page_secs),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                field: "CONTENT_FETCH_MAX_CONCURRENT",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_per_page_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "CONTENT_FETCH_TIMEOUT_PER_PAGE_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ContentFetchConfig {
    fn default() -> Self {
        Self {
            jina_api_key: None,
            max_concurrent: 5,
            timeout_per_page_secs: 30,
        }
    }
}
