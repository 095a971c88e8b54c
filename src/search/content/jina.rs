//! Jina Reader page extraction
//!
//! `GET https://r.jina.ai/{url}` returns the page main text as markdown.
//! Link targets are stripped so only the readable text reaches the summarizer.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use tracing::debug;

use super::fetcher::{FetchError, PageExtractor};

pub const JINA_READER_URL: &str = "https://r.jina.ai";

/// Extractor backed by the Jina Reader API
pub struct JinaReader {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl JinaReader {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, JINA_READER_URL.to_string())
    }

    /// Point the reader at another host (local fakes in tests)
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn reader_url(&self, url: &str) -> String {
        format!("{}/{}", self.base_url, url)
    }
}

/// Remove `(http...)` and `[http...]` link artifacts from reader markdown
pub fn strip_link_artifacts(markdown: &str) -> String {
    static LINKS: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = LINKS.get_or_init(|| Regex::new(r"\(https?:.*?\)|\[https?:.*?\]").ok());

    match pattern {
        Some(re) => re.replace_all(markdown, "").trim().to_string(),
        None => markdown.trim().to_string(),
    }
}

#[async_trait]
impl PageExtractor for JinaReader {
    async fn extract(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self
            .client
            .get(self.reader_url(url))
            .header("X-Return-Format", "markdown");
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(FetchError::HttpStatus(status.as_u16(), snippet));
        }

        debug!("Jina returned {} bytes for {}", body.len(), url);
        Ok(strip_link_artifacts(&body))
    }

    fn name(&self) -> &'static str {
        "jina"
    }
}
