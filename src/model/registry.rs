// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Immutable model registry
//!
//! Built once at start-up and shared by `Arc` with the request handlers.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::client::{ChatModel, OpenAiCompatClient};
use crate::config::{ModelEntry, ModelsConfig};

/// Public description of a configured model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model: String,
    pub display_name: String,
    pub base_url: String,
    pub model_name: String,
}

struct RegisteredModel {
    info: ModelInfo,
    client: Arc<dyn ChatModel>,
}

/// Model id → client lookup
#[derive(Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, RegisteredModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One OpenAI-compatible client per configured entry
    pub fn from_config(config: &ModelsConfig) -> Self {
        let mut registry = Self::new();
        for (id, entry) in &config.models {
            let client = OpenAiCompatClient::new(&entry.base_url, &entry.model_name)
                .with_api_key(entry.api_key.clone())
                .with_think_prefix(entry.think_prefix.clone());
            registry = registry.with_model(id, entry, Arc::new(client));
        }
        info!("Model registry ready with {} models", registry.len());
        registry
    }

    /// Register `client` under `id`
    pub fn with_model(mut self, id: &str, entry: &ModelEntry, client: Arc<dyn ChatModel>) -> Self {
        self.models.insert(
            id.to_string(),
            RegisteredModel {
                info: ModelInfo {
                    model: id.to_string(),
                    display_name: entry.display_name.clone(),
                    base_url: entry.base_url.clone(),
                    model_name: entry.model_name.clone(),
                },
                client,
            },
        );
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ChatModel>> {
        self.models.get(id).map(|m| m.client.clone())
    }

    /// All models, ordered by id
    pub fn list(&self) -> Vec<ModelInfo> {
        self.models.values().map(|m| m.info.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
