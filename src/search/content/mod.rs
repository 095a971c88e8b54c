//! Content fetching for search results
//!
//! Fetches the main text behind each search result URL so the summarizer
//! works from real page text instead of snippets.
//!
//! ## Architecture
//!
//! ```text
//! Search Results (URLs) → ContentFetcher (bounded pool, per-page timeout)
//!                              ↓
//!                        PageExtractor (Jina Reader) → markdown text
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let config = ContentFetchConfig::from_env();
//! let reader = Arc::new(JinaReader::new(config.jina_api_key.clone()));
//! let fetcher = ContentFetcher::new(reader, config);
//!
//! let pages = fetcher.fetch_many(vec!["https://example.com".to_string()]).await;
//! ```

pub mod config;
pub mod fetcher;
pub mod jina;

pub use config::ContentFetchConfig;
pub use fetcher::{ContentFetcher, FetchError, PageExtractor};
pub use jina::JinaReader;
