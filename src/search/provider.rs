// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search provider trait definition

use async_trait::async_trait;

use super::types::{SearchError, SearchHit};

/// Trait for implementing search providers
///
/// A provider isolates one upstream API: its request shape, response decoding
/// and retry policy. Errors are returned as-is; the search service decides how
/// to degrade.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Perform a web search
    ///
    /// # Arguments
    /// * `query` - The search query string
    /// * `limit` - Maximum number of results to return
    ///
    /// # Returns
    /// Hits in provider relevance order, at most `limit` of them
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Get the provider name for logging
    fn name(&self) -> &'static str;
}
