// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search-and-fetch orchestration
//!
//! Coordinates the result cache, the rate-limited search provider and the
//! concurrent page fetcher. Every search-based workflow goes through
//! [`SearchService::search_and_fetch`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::brightdata::BrightDataSearchProvider;
use super::cache::ResultCache;
use super::config::{ProviderKind, SearchConfig};
use super::content::{ContentFetchConfig, ContentFetcher, JinaReader};
use super::provider::SearchProvider;
use super::rate_limiter::SearchRateLimiter;
use super::serper::SerperSearchProvider;
use super::types::{SearchHit, SearchResult};
use crate::config::ConfigError;

/// Cache-aware search + fetch pipeline
pub struct SearchService {
    provider: Arc<dyn SearchProvider>,
    fetcher: ContentFetcher,
    cache: Arc<ResultCache>,
    rate_limiter: SearchRateLimiter,
}

impl SearchService {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        fetcher: ContentFetcher,
        cache: Arc<ResultCache>,
        rate_limiter: SearchRateLimiter,
    ) -> Self {
        Self {
            provider,
            fetcher,
            cache,
            rate_limiter,
        }
    }

    /// Build the service from configuration
    ///
    /// Missing provider credentials are not fatal: searches then come back
    /// empty and the workflows answer without retrieved context.
    pub fn from_config(
        search: &SearchConfig,
        content: ContentFetchConfig,
    ) -> Result<Self, ConfigError> {
        search.validate()?;
        content.validate()?;

        if !search.has_credentials() {
            warn!(
                "No API key configured for {:?} search provider; searches will return no results",
                search.provider
            );
        }

        let timeout = Duration::from_secs(search.request_timeout_secs);
        let provider: Arc<dyn SearchProvider> = match search.provider {
            ProviderKind::Serper => Arc::new(SerperSearchProvider::new(
                search.providers.serper_api_key.clone().unwrap_or_default(),
                timeout,
            )),
            ProviderKind::BrightData => Arc::new(BrightDataSearchProvider::new(
                search.providers.brightdata_api_key.clone().unwrap_or_default(),
                search.providers.brightdata_zone.clone(),
                timeout,
            )),
        };
        debug!("Search provider enabled: {}", provider.name());

        let reader = Arc::new(JinaReader::new(content.jina_api_key.clone()));
        let fetcher = ContentFetcher::new(reader, content);
        let cache = Arc::new(ResultCache::open(&search.cache_path)?);
        let rate_limiter = SearchRateLimiter::new(search.rate_limit_per_minute);

        Ok(Self::new(provider, fetcher, cache, rate_limiter))
    }

    /// Query the provider, degrading any failure to an empty list
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.rate_limiter.wait().await;

        let start = Instant::now();
        match self.provider.search(query, limit).await {
            Ok(hits) => {
                if hits.is_empty() {
                    warn!("{} returned no results for '{}'", self.provider.name(), query);
                } else {
                    info!(
                        "Search complete: {} results from {} in {}ms",
                        hits.len(),
                        self.provider.name(),
                        start.elapsed().as_millis()
                    );
                }
                hits
            }
            Err(e) => {
                warn!("Search provider {} failed: {}", self.provider.name(), e);
                Vec::new()
            }
        }
    }

    /// Cached search followed by concurrent page fetching
    ///
    /// A cache entry with at least `top_k` results is returned without any
    /// network call. Otherwise the provider is queried, the distinct result
    /// URLs are fetched concurrently, and the combined list replaces the cache
    /// entry for `query`.
    pub async fn search_and_fetch(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        if let Some(cached) = self.cache.get(query, top_k).await {
            info!("Using cached results for '{}' ({} results)", query, cached.len());
            return cached;
        }

        let hits = self.search(query, top_k).await;
        if hits.is_empty() {
            return Vec::new();
        }

        let urls: Vec<String> = hits
            .iter()
            .filter(|h| !h.url.is_empty())
            .map(|h| h.url.clone())
            .collect();
        debug!("Fetching {} pages for '{}'", urls.len(), query);
        let pages = self.fetcher.fetch_many(urls).await;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| {
                let content = pages.get(&hit.url).cloned().unwrap_or_default();
                SearchResult::from_hit(hit, content)
            })
            .collect();

        if let Err(e) = self.cache.put(query, results.clone()).await {
            warn!("Failed to cache results for '{}': {}", query, e);
        } else {
            debug!("Cached {} results for '{}'", results.len(), query);
        }

        results
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}
