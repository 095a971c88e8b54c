// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Durable search result cache
//!
//! Maps the literal query string to the enriched results produced for it.
//! The whole map is kept in memory and rewritten to a JSON file after every
//! change. The snapshot is taken under the map lock; the file write runs on
//! the blocking pool through a temporary file renamed over the target, so
//! readers never observe a half-written store.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{is_failure_content, SearchResult};

/// Errors raised while persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace cache file {path}: {message}")]
    Persist { path: String, message: String },

    #[error("Cache write task failed: {0}")]
    Task(String),
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached queries
    pub queries: usize,
    /// Total stored results across all queries
    pub results: usize,
}

/// File-backed query → results cache shared across requests
pub struct ResultCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, Vec<SearchResult>>>,
    /// Held across a file write so snapshots land in the order they were taken
    writer: Mutex<()>,
}

impl ResultCache {
    /// Open the cache at `path`, loading any existing entries
    ///
    /// A missing file starts an empty cache. A file that cannot be parsed is
    /// logged and ignored; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = Self::load(&path)?;
        info!(
            "Search cache opened at {} ({} queries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            writer: Mutex::new(()),
        })
    }

    fn load(path: &Path) -> Result<HashMap<String, Vec<SearchResult>>, CacheError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(
                    "Ignoring unreadable search cache {}: {}",
                    path.display(),
                    e
                );
                Ok(HashMap::new())
            }
        }
    }

    /// Look up `query`, hitting only when at least `top_k` results are stored
    ///
    /// Keys are exact strings: a query differing in case or whitespace misses.
    pub async fn get(&self, query: &str, top_k: usize) -> Option<Vec<SearchResult>> {
        let entries = self.entries.lock().await;
        let stored = entries.get(query)?;

        if stored.len() < top_k {
            debug!(
                "Cache entry for '{}' too short ({} < {})",
                query,
                stored.len(),
                top_k
            );
            return None;
        }

        Some(stored[..top_k].to_vec())
    }

    /// Store `results` under `query` and persist the cache
    pub async fn put(&self, query: &str, results: Vec<SearchResult>) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(query.to_string(), results);
        let snapshot = Snapshot::take(&entries)?;
        let writer = self.writer.lock().await;
        drop(entries);

        self.write(snapshot).await?;
        drop(writer);
        Ok(())
    }

    /// Drop failure-marked results from every entry
    ///
    /// Returns true when something was removed; the file is only rewritten
    /// in that case.
    pub async fn clean_failures(&self) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock().await;
        let mut removed = 0usize;

        for results in entries.values_mut() {
            let before = results.len();
            results.retain(|r| !is_failure_content(&r.content));
            removed += before - results.len();
        }

        if removed == 0 {
            info!("Search cache is already clean");
            return Ok(false);
        }

        let snapshot = Snapshot::take(&entries)?;
        let writer = self.writer.lock().await;
        drop(entries);

        self.write(snapshot).await?;
        drop(writer);
        info!("Removed {} failed results from search cache", removed);
        Ok(true)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            queries: entries.len(),
            results: entries.values().map(Vec::len).sum(),
        }
    }

    async fn write(&self, snapshot: Snapshot) -> Result<(), CacheError> {
        let path = self.path.clone();
        let queries = snapshot.queries;
        tokio::task::spawn_blocking(move || write_atomically(&path, &snapshot.json))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))??;

        debug!("Search cache written ({} queries)", queries);
        Ok(())
    }
}

/// Serialized copy of the map, taken while the lock is held
struct Snapshot {
    json: String,
    queries: usize,
}

impl Snapshot {
    fn take(entries: &HashMap<String, Vec<SearchResult>>) -> Result<Self, CacheError> {
        Ok(Self {
            json: serde_json::to_string_pretty(entries)?,
            queries: entries.len(),
        })
    }
}

/// Whole-file rewrite through a temp file and rename
fn write_atomically(path: &Path, json: &str) -> Result<(), CacheError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| CacheError::Persist {
        path: path.display().to_string(),
        message: e.error.to_string(),
    })?;
    Ok(())
}
