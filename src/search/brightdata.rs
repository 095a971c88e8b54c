// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bright Data SERP provider
//!
//! Fetches Bing result pages through the Bright Data request API with
//! `brd_json=1`, which returns the parsed SERP as JSON. The proxy occasionally
//! answers with a non-200 status or an undecodable body, so each search is
//! retried a fixed number of times.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::provider::SearchProvider;
use super::types::{SearchError, SearchHit};

pub const BRIGHTDATA_API_URL: &str = "https://api.brightdata.com/request";
const BING_SEARCH_URL: &str = "https://www.bing.com/search";
const MAX_ATTEMPTS: u32 = 4;
const RESULTS_PER_PAGE: usize = 10;

/// Bright Data (Bing SERP) provider
pub struct BrightDataSearchProvider {
    api_key: String,
    zone: String,
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl BrightDataSearchProvider {
    pub fn new(api_key: String, zone: String, timeout: Duration) -> Self {
        Self::with_endpoint(api_key, zone, BRIGHTDATA_API_URL.to_string(), timeout)
    }

    pub fn with_endpoint(api_key: String, zone: String, endpoint: String, timeout: Duration) -> Self {
        Self {
            api_key,
            zone,
            endpoint,
            timeout,
            client: Client::new(),
        }
    }

    /// Build the Bing URL that Bright Data should fetch
    fn target_url(query: &str) -> Result<Url, SearchError> {
        let (market, language) = market_for(query);
        Url::parse_with_params(
            BING_SEARCH_URL,
            &[
                ("q", query),
                ("mkt", market),
                ("setLang", language),
                ("num", &RESULTS_PER_PAGE.to_string()),
                ("textFormat", "Raw"),
                ("brd_json", "1"),
                ("cc", "cn"),
            ],
        )
        .map_err(|e| SearchError::InvalidResponse {
            provider: "brightdata".to_string(),
            message: format!("cannot build search url: {}", e),
        })
    }

    async fn attempt(&self, target: &Url) -> Option<BrightDataResponse> {
        let response = match self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "zone": self.zone,
                "url": target.as_str(),
                "format": "raw",
            }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Bright Data request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Bright Data returned HTTP {}", response.status());
            return None;
        }

        match response.json::<BrightDataResponse>().await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("Bright Data body was not valid SERP JSON: {}", e);
                None
            }
        }
    }
}

/// Pick the Bing market from the query script.
///
/// Queries containing CJK ideographs are searched on the Chinese market,
/// everything else on en-US.
pub fn market_for(query: &str) -> (&'static str, &'static str) {
    let has_cjk = query
        .chars()
        .any(|c| matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}'));
    if has_cjk {
        ("zh-CN", "zh")
    } else {
        ("en-US", "en")
    }
}

#[async_trait]
impl SearchProvider for BrightDataSearchProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey {
                provider: "brightdata".to_string(),
            });
        }

        let target = Self::target_url(query)?;

        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(data) = self.attempt(&target).await {
                return Ok(data
                    .organic
                    .into_iter()
                    .take(limit)
                    .map(|r| SearchHit {
                        title: r.title,
                        url: r.link,
                        snippet: r.description,
                    })
                    .collect());
            }
            warn!(
                "Bright Data attempt {}/{} failed for '{}'",
                attempt, MAX_ATTEMPTS, query
            );
        }

        Err(SearchError::RetriesExhausted {
            provider: "brightdata".to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    fn name(&self) -> &'static str {
        "brightdata"
    }
}

#[derive(Debug, Deserialize)]
struct BrightDataResponse {
    #[serde(default)]
    organic: Vec<BrightDataOrganic>,
}

#[derive(Debug, Deserialize)]
struct BrightDataOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
}
