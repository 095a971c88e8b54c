// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for web search functionality

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::ConfigError;

/// Which upstream search API to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Serper,
    BrightData,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serper" => Ok(Self::Serper),
            "brightdata" | "bright_data" | "bing" => Ok(Self::BrightData),
            other => Err(ConfigError::Invalid {
                field: "SEARCH_PROVIDER",
                reason: format!("unknown provider '{}'", other),
            }),
        }
    }
}

/// Configuration for web search functionality
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Provider used for keyword search
    pub provider: ProviderKind,
    /// Provider-specific credentials
    pub providers: SearchProviderConfig,
    /// Results requested per search (also the cache length requirement)
    pub top_k: usize,
    /// Provider request timeout in seconds
    pub request_timeout_secs: u64,
    /// Rate limit (requests per minute)
    pub rate_limit_per_minute: u32,
    /// JSON file backing the result cache
    pub cache_path: PathBuf,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default)]
pub struct SearchProviderConfig {
    pub serper_api_key: Option<String>,
    pub brightdata_api_key: Option<String>,
    pub brightdata_zone: String,
}

impl SearchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let provider = match env::var("SEARCH_PROVIDER") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => defaults.provider,
        };

        Ok(Self {
            provider,
            providers: SearchProviderConfig {
                serper_api_key: env::var("SERPER_API_KEY").ok(),
                brightdata_api_key: env::var("BRIGHTDATA_API_KEY")
                    .or_else(|_| env::var("BING_API_KEY"))
                    .ok(),
                brightdata_zone: env::var("BRIGHTDATA_ZONE")
                    .unwrap_or(defaults.providers.brightdata_zone),
            },
            top_k: env::var("SEARCH_TOP_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.top_k),
            request_timeout_secs: env::var("SEARCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            rate_limit_per_minute: env::var("SEARCH_RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            cache_path: env::var("SEARCH_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "SEARCH_TOP_K",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "SEARCH_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                field: "SEARCH_RATE_LIMIT_PER_MINUTE",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the selected provider has credentials
    pub fn has_credentials(&self) -> bool {
        let key = match self.provider {
            ProviderKind::Serper => &self.providers.serper_api_key,
            ProviderKind::BrightData => &self.providers.brightdata_api_key,
        };
        key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Serper,
            providers: SearchProviderConfig {
                serper_api_key: None,
                brightdata_api_key: None,
                brightdata_zone: "serp_api1".to_string(),
            },
            top_k: 5,
            request_timeout_secs: 10,
            rate_limit_per_minute: 60,
            cache_path: PathBuf::from(".cache/search_cache.json"),
        }
    }
}
