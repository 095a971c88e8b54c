// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model backend definitions loaded from TOML
//!
//! ```toml
//! [models.qwen3-vl-8b-thinking]
//! display_name = "Qwen3-VL 8B Thinking"
//! base_url = "http://localhost:8000/v1/chat/completions"
//! model_name = "Qwen/Qwen3-VL-8B-Thinking"
//! think_prefix = "<think>"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::ConfigError;

/// One configured model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub display_name: String,
    /// OpenAI-compatible chat completions URL (or its `/v1` base)
    pub base_url: String,
    /// Model name sent in the request body
    pub model_name: String,
    /// Emitted as the first token of every stream when set
    #[serde(default)]
    pub think_prefix: Option<String>,
    /// Bearer token for backends behind an auth gateway
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Contents of the model registry file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub models: BTreeMap<String, ModelEntry>,
}

impl ModelsConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ModelsConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, entry) in &self.models {
            if entry.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "models.base_url",
                    reason: format!("model '{}' has an empty base_url", id),
                });
            }
            if entry.model_name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "models.model_name",
                    reason: format!("model '{}' has an empty model_name", id),
                });
            }
        }
        Ok(())
    }
}
