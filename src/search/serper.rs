// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Serper.dev provider
//!
//! Google web search through the Serper API. This is the default provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::provider::SearchProvider;
use super::types::{SearchError, SearchHit};

pub const SERPER_API_URL: &str = "https://google.serper.dev/search";

/// Serper.dev search provider
pub struct SerperSearchProvider {
    api_key: String,
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl SerperSearchProvider {
    /// Create a new Serper provider
    ///
    /// # Arguments
    /// * `api_key` - Serper API key
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, SERPER_API_URL.to_string(), timeout)
    }

    /// Create a provider that talks to a non-default endpoint
    pub fn with_endpoint(api_key: String, endpoint: String, timeout: Duration) -> Self {
        Self {
            api_key,
            endpoint,
            timeout,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey {
                provider: "serper".to_string(),
            });
        }

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    SearchError::ApiError {
                        status: 0,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();

        if status == 429 {
            return Err(SearchError::RateLimited {
                retry_after_secs: 60,
            });
        }

        if status == 401 || status == 403 {
            return Err(SearchError::NoApiKey {
                provider: "serper".to_string(),
            });
        }

        if !status.is_success() {
            let message: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let data: SerperResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::InvalidResponse {
                    provider: "serper".to_string(),
                    message: e.to_string(),
                })?;

        if data.organic.is_empty() {
            debug!("Serper returned no organic results for '{}'", query);
        }

        Ok(data
            .organic
            .into_iter()
            .take(limit)
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "serper"
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}
