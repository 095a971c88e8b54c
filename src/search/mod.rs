// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Web search, page fetching and summarization
//!
//! Provides the retrieval pipeline used by the search-based workflows:
//! - Keyword search through Serper (Google) or Bright Data (Bing)
//! - Concurrent page extraction through Jina Reader
//! - Durable query → results cache
//! - Multi-page summarization with a chat model
//!
//! Provider and fetch failures degrade to empty or failure-marked results
//! instead of errors.

pub mod brightdata;
pub mod cache;
pub mod config;
pub mod content;
pub mod provider;
pub mod rate_limiter;
pub mod serper;
pub mod service;
pub mod summarizer;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheError, ResultCache};
pub use config::{ProviderKind, SearchConfig};
pub use provider::SearchProvider;
pub use service::SearchService;
pub use summarizer::{Summarizer, SummarizerConfig, NO_CONTENT_SENTINEL};
pub use types::{
    failure_content, is_failure_content, SearchError, SearchHit, SearchResult, FAILURE_MARKER,
};

pub use content::{ContentFetchConfig, ContentFetcher, FetchError, JinaReader, PageExtractor};
