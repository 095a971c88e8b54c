// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-page summarization
//!
//! Condenses the fetched pages of one search into a single digest with one
//! non-streaming completion call.

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{failure_content, SearchResult};
use crate::config::ConfigError;
use crate::model::{ChatMessage, ChatModel, GenerationParams, OpenAiCompatClient};

/// Returned without a model call when no page has usable content
pub const NO_CONTENT_SENTINEL: &str = "[Error] No valid page content to summarize.";

const SYNTHESIS_INSTRUCTION: &str = "You will see the content of several web pages collected for the same topic.\n\
Write one comprehensive summary based on all of them:\n\
1. Merge the information from every page instead of restating each page in turn;\n\
2. Remove duplicated content and keep the key facts;\n\
3. Stay objective and neutral, sticking to facts;\n\
4. Use clear, coherent natural language;\n\
5. Output only the summary, without describing the process.\n\n\
The web pages:\n\n";

/// Configuration for the summarization model
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// OpenAI-compatible API base or chat completions URL
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Characters kept from each page (default: 10000)
    pub max_chars_per_page: usize,
    /// Completion request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl SummarizerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("SUMMARIZER_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("SUMMARIZER_API_KEY")
                .or_else(|_| env::var("PARATERA_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            model: env::var("SUMMARIZER_MODEL").unwrap_or(defaults.model),
            max_chars_per_page: env::var("SUMMARIZER_MAX_CHARS_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_chars_per_page),
            timeout_secs: env::var("SUMMARIZER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "SUMMARIZER_BASE_URL",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_chars_per_page == 0 {
            return Err(ConfigError::Invalid {
                field: "SUMMARIZER_MAX_CHARS_PER_PAGE",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://llmapi.paratera.com/v1/".to_string(),
            api_key: None,
            model: "DeepSeek-V3.1-Terminus".to_string(),
            max_chars_per_page: 10_000,
            timeout_secs: 120,
        }
    }
}

/// Build the synthesis prompt, `None` when no page is usable
///
/// Pages keep their position in `results` as their heading number.
pub fn build_prompt(results: &[SearchResult], max_chars_per_page: usize) -> Option<String> {
    let sections: Vec<String> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_usable_content())
        .map(|(i, r)| {
            let text: String = r.content.chars().take(max_chars_per_page).collect();
            format!("### Page {}: {}\n{}", i + 1, r.title, text)
        })
        .collect();

    if sections.is_empty() {
        return None;
    }
    Some(format!("{}{}", SYNTHESIS_INSTRUCTION, sections.join("\n\n")))
}

/// Page digest writer backed by a chat model
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    max_chars_per_page: usize,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>, max_chars_per_page: usize) -> Self {
        Self {
            model,
            max_chars_per_page,
        }
    }

    pub fn from_config(config: &SummarizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.api_key.is_none() {
            warn!("No summarizer API key configured; summaries will likely fail");
        }
        let client = OpenAiCompatClient::new(&config.base_url, &config.model)
            .with_api_key(config.api_key.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));
        Ok(Self::new(Arc::new(client), config.max_chars_per_page))
    }

    /// Summarize the usable pages in `results`
    ///
    /// Returns [`NO_CONTENT_SENTINEL`] without calling the model when every
    /// page is empty or failure-marked. A failed model call yields a
    /// failure-marked string so the caller can carry on.
    pub async fn summarize(&self, results: &[SearchResult]) -> String {
        let prompt = match build_prompt(results, self.max_chars_per_page) {
            Some(prompt) => prompt,
            None => {
                debug!("No usable pages among {} results", results.len());
                return NO_CONTENT_SENTINEL.to_string();
            }
        };

        let start = Instant::now();
        let messages = [ChatMessage::user(prompt, &[])];
        match self
            .model
            .complete(&messages, &GenerationParams::backend_defaults())
            .await
        {
            Ok(summary) => {
                info!(
                    "Summarized {} results in {}ms",
                    results.len(),
                    start.elapsed().as_millis()
                );
                summary
            }
            Err(e) => {
                warn!("Summarization failed: {}", e);
                failure_content(format!("Summarization failed: {}", e))
            }
        }
    }
}
