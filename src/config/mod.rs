// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration
//!
//! Each subsystem owns its settings struct with `from_env()`, `Default` and
//! `validate()`. [`AppConfig`] gathers them at start-up.

pub mod models;

use std::path::PathBuf;
use thiserror::Error;

pub use models::{ModelEntry, ModelsConfig};

use crate::search::cache::CacheError;
use crate::search::content::ContentFetchConfig;
use crate::search::summarizer::SummarizerConfig;
use crate::search::SearchConfig;
use crate::workflow::WorkflowConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Search cache unavailable: {0}")]
    Cache(#[from] CacheError),
}

/// All settings read from the environment at start-up
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub content: ContentFetchConfig,
    pub summarizer: SummarizerConfig,
    pub workflow: WorkflowConfig,
    /// Path of the model registry file
    pub models_path: PathBuf,
}

impl AppConfig {
    /// Load every subsystem's configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let search = SearchConfig::from_env()?;
        let workflow = WorkflowConfig::from_env(search.top_k);

        Ok(Self {
            search,
            content: ContentFetchConfig::from_env(),
            summarizer: SummarizerConfig::from_env(),
            workflow,
            models_path: std::env::var("MODELS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models.toml")),
        })
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        self.content.validate()?;
        self.summarizer.validate()?;
        self.workflow.validate()?;
        Ok(())
    }
}
