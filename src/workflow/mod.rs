// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reasoning workflows
//!
//! Three modes share the same primitives:
//! - `direct_reasoning`: one streamed generation
//! - `naive_rag`: one search with the user query, then a grounded answer
//! - `agentic_search`: the model requests searches itself, up to a round limit
//!
//! Every run ends with exactly one terminal event (`done` or `error`),
//! emitted by [`run_workflow`].

pub mod agentic;
pub mod direct;
pub mod directive;
pub mod events;
pub mod naive_rag;
pub mod prompts;

use futures::StreamExt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use directive::extract_search_query;
pub use events::{EventSink, FinishReason, StreamEvent};

use crate::config::ConfigError;
use crate::model::{ChatMessage, ChatModel, GenerationParams, ModelError};
use crate::search::{SearchService, Summarizer};

/// Default bound on model rounds in agentic mode
pub const DEFAULT_MAX_ROUNDS: usize = 20;

/// Workflow errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The event receiver was dropped
    #[error("client disconnected")]
    Disconnected,
}

/// Reasoning mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DirectReasoning,
    NaiveRag,
    AgenticSearch,
}

#[derive(Debug, Error)]
#[error("Unknown mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct_reasoning" => Ok(Self::DirectReasoning),
            "naive_rag" => Ok(Self::NaiveRag),
            "agentic_search" => Ok(Self::AgenticSearch),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectReasoning => "direct_reasoning",
            Self::NaiveRag => "naive_rag",
            Self::AgenticSearch => "agentic_search",
        }
    }
}

/// Workflow tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Maximum model rounds in agentic mode (default: 20)
    pub max_rounds: usize,
    /// Results retrieved per search (default: 5)
    pub top_k: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            top_k: 5,
        }
    }
}

impl WorkflowConfig {
    /// `AGENTIC_MAX_ROUNDS` from the environment, `top_k` from the search settings
    pub fn from_env(top_k: usize) -> Self {
        Self {
            max_rounds: std::env::var("AGENTIC_MAX_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ROUNDS),
            top_k,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "AGENTIC_MAX_ROUNDS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "SEARCH_TOP_K",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Collaborators for one run
#[derive(Clone)]
pub struct WorkflowContext {
    pub model: Arc<dyn ChatModel>,
    pub search: Arc<SearchService>,
    pub summarizer: Arc<Summarizer>,
    pub config: WorkflowConfig,
}

/// What the caller asked
#[derive(Debug, Clone, Default)]
pub struct InferRequest {
    pub query: String,
    pub images: Vec<PathBuf>,
}

impl InferRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }
}

/// Result of streaming one generation
#[derive(Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Stream exhausted; the full generated text
    Finished(String),
    Cancelled,
}

/// Stream one generation, forwarding every fragment as a token event
///
/// Cancellation and a dropped receiver are observed while waiting for the
/// stream to open and between fragments.
pub async fn stream_tokens(
    model: &dyn ChatModel,
    messages: &[ChatMessage],
    params: &GenerationParams,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Result<RoundOutcome, WorkflowError> {
    let mut tokens = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(RoundOutcome::Cancelled),
        _ = sink.closed() => return Err(WorkflowError::Disconnected),
        opened = model.stream_chat(messages, params) => opened?,
    };

    let mut output = String::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(RoundOutcome::Cancelled),
            _ = sink.closed() => return Err(WorkflowError::Disconnected),
            next = tokens.next() => next,
        };

        match next {
            Some(Ok(token)) => {
                output.push_str(&token);
                sink.send(StreamEvent::token(token)).await?;
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(RoundOutcome::Finished(output)),
        }
    }
}

/// Search, fetch and summarize, `None` when cancelled first
pub async fn search_and_summarize(
    ctx: &WorkflowContext,
    query: &str,
    sink: &EventSink,
    cancel: &CancellationToken,
) -> Result<Option<String>, WorkflowError> {
    let pipeline = async {
        let results = ctx.search.search_and_fetch(query, ctx.config.top_k).await;
        ctx.summarizer.summarize(&results).await
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        _ = sink.closed() => Err(WorkflowError::Disconnected),
        summary = pipeline => Ok(Some(summary)),
    }
}

/// Run `mode` to completion and emit its single terminal event
pub async fn run_workflow(
    mode: Mode,
    ctx: WorkflowContext,
    request: InferRequest,
    sink: EventSink,
    cancel: CancellationToken,
) {
    info!(
        "Starting {} workflow ({} images)",
        mode.as_str(),
        request.images.len()
    );

    let outcome = match mode {
        Mode::DirectReasoning => direct::run(&ctx, &request, &sink, &cancel).await,
        Mode::NaiveRag => naive_rag::run(&ctx, &request, &sink, &cancel).await,
        Mode::AgenticSearch => agentic::run(&ctx, &request, &sink, &cancel).await,
    };

    let terminal = match outcome {
        Ok(reason) => {
            info!("{} workflow finished: {:?}", mode.as_str(), reason);
            StreamEvent::Done { reason }
        }
        Err(WorkflowError::Disconnected) => {
            info!("{} workflow abandoned: client disconnected", mode.as_str());
            return;
        }
        Err(e) => {
            error!("{} workflow failed: {}", mode.as_str(), e);
            StreamEvent::Error {
                message: e.to_string(),
            }
        }
    };

    // Nobody left to tell when this fails
    let _ = sink.send(terminal).await;
}
