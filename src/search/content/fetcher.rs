//! Concurrent page fetching with per-page timeouts
//!
//! Turns search result URLs into page text through a [`PageExtractor`].
//! Failures never surface as errors: every requested URL gets a content
//! string, failure-marked when the fetch did not succeed.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::{Host, Url};

use super::config::ContentFetchConfig;
use crate::search::types::failure_content;

/// Why a single page could not be extracted
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Timeout fetching: {0}")]
    Timeout(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("HTTP {0}: {1}")]
    HttpStatus(u16, String),

    /// Loopback, private or non-http(s) target
    #[error("Unsafe URL blocked: {0}")]
    UnsafeUrl(String),
}

/// An external service that turns a URL into readable main text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageExtractor: Send + Sync {
    /// Fetch `url` and return its main text
    async fn extract(&self, url: &str) -> Result<String, FetchError>;

    /// Service name for logging
    fn name(&self) -> &'static str;
}

/// Bounded-concurrency fetcher in front of a page extractor
#[derive(Clone)]
pub struct ContentFetcher {
    extractor: Arc<dyn PageExtractor>,
    config: ContentFetchConfig,
}

impl ContentFetcher {
    /// Create a new content fetcher
    pub fn new(extractor: Arc<dyn PageExtractor>, config: ContentFetchConfig) -> Self {
        Self { extractor, config }
    }

    /// Fetch one page, always yielding a content string
    pub async fn fetch_content(&self, url: &str) -> String {
        if !Self::is_safe_url(url) {
            warn!("Refusing to fetch {}", url);
            return failure_content(FetchError::UnsafeUrl(url.to_string()));
        }

        let per_page = Duration::from_secs(self.config.timeout_per_page_secs);
        let started = Instant::now();

        match timeout(per_page, self.extractor.extract(url)).await {
            Ok(Ok(text)) => {
                debug!(
                    "Fetched {} chars from {} via {} in {}ms",
                    text.len(),
                    url,
                    self.extractor.name(),
                    started.elapsed().as_millis()
                );
                text
            }
            Ok(Err(e)) => {
                warn!("Fetch failed for {}: {}", url, e);
                failure_content(format!("Failed fetching {}: {}", url, e))
            }
            Err(_) => {
                warn!("Fetch timed out after {}s: {}", per_page.as_secs(), url);
                failure_content(FetchError::Timeout(url.to_string()))
            }
        }
    }

    /// Fetch many pages with at most `max_concurrent` in flight
    ///
    /// The returned map holds exactly one entry per distinct input URL, in
    /// no particular order. One slow or failing page never discards the
    /// others.
    pub async fn fetch_many<I, S>(&self, urls: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .into_iter()
            .map(Into::into)
            .filter(|u| seen.insert(u.clone()))
            .collect();

        if unique.is_empty() {
            return HashMap::new();
        }

        let total = unique.len();
        let started = Instant::now();

        let pages: HashMap<String, String> = stream::iter(unique)
            .map(|url| async move {
                let content = self.fetch_content(&url).await;
                (url, content)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let failed = pages
            .values()
            .filter(|c| crate::search::types::is_failure_content(c))
            .count();
        info!(
            "Fetched {} pages ({} failed) in {}ms",
            total,
            failed,
            started.elapsed().as_millis()
        );

        pages
    }

    /// Only public http(s) hosts may be handed to the extractor
    pub fn is_safe_url(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        match parsed.host() {
            Some(Host::Domain(domain)) => !domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => is_public_ip(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => is_public_ip(IpAddr::V6(ip)),
            None => false,
        }
    }
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let link_local = first & 0xffc0 == 0xfe80;
            let unique_local = first & 0xfe00 == 0xfc00;
            !(v6.is_loopback() || v6.is_unspecified() || link_local || unique_local)
        }
    }
}
