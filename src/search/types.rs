// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for web search functionality

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix carried by page content that could not be fetched.
///
/// Failed fetches are recorded as content rather than raised, so a batch never
/// aborts on one bad page and consumers filter with [`is_failure_content`].
pub const FAILURE_MARKER: &str = "[Error]";

/// Returns true when `content` is a failure-marked placeholder.
pub fn is_failure_content(content: &str) -> bool {
    content.starts_with(FAILURE_MARKER)
}

/// Build a failure-marked content string.
pub fn failure_content(reason: impl std::fmt::Display) -> String {
    format!("{} {}", FAILURE_MARKER, reason)
}

/// A single ranked candidate returned by a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Title of the search result
    pub title: String,
    /// URL of the search result
    pub url: String,
    /// Snippet/description of the search result
    pub snippet: String,
}

/// A search hit enriched with the fetched page text
///
/// `content` is either readable page text, an empty string (no fetch was made
/// for the URL) or a failure-marked string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    #[serde(default)]
    pub content: String,
}

impl SearchResult {
    /// Attach fetched content to a provider hit
    pub fn from_hit(hit: SearchHit, content: String) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
            content,
        }
    }

    /// Whether this result carries page text usable for summarization
    pub fn has_usable_content(&self) -> bool {
        !self.content.is_empty() && !is_failure_content(&self.content)
    }
}

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Rate limited by the search provider
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying
        retry_after_secs: u64,
    },

    /// API error from the search provider
    #[error("Search API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Search request timed out
    #[error("Search timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// No API key configured for the provider
    #[error("No API key configured for {provider}")]
    NoApiKey {
        /// Name of the provider missing API key
        provider: String,
    },

    /// Provider answered but the body could not be decoded
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Every retry attempt failed
    #[error("{provider} failed after {attempts} attempts")]
    RetriesExhausted { provider: String, attempts: u32 },
}
