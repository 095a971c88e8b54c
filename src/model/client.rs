// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat model clients over the OpenAI-compatible API
//!
//! Works against vLLM's `/v1/chat/completions` for the reasoning models and
//! any OpenAI-compatible gateway for the summarizer.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::sse::{delta_content, SseBuffer, SseEvent};
use super::types::{ChatMessage, ContentPart, GenerationParams, ModelError};

/// Incremental text fragments from a streamed generation
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// A language model that can stream or complete a conversation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start a streamed generation
    ///
    /// Fails before the first token when the backend rejects the request.
    /// Later transport failures surface as an `Err` item in the stream.
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<TokenStream, ModelError>;

    /// Single non-streaming completion returning the full text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, ModelError>;
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    include_stop_str_in_output: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// MIME type for an image file, by extension
pub fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

/// Resolve `base_url` to the chat completions endpoint
///
/// Accepts either the full endpoint or an API base such as `.../v1/`.
pub fn chat_completions_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// Client for one model behind an OpenAI-compatible endpoint
pub struct OpenAiCompatClient {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: Option<String>,
    think_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiCompatClient {
    pub fn new(base_url: &str, model_name: &str) -> Self {
        let endpoint = chat_completions_url(base_url);
        info!(
            "Model client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Self {
            client: Client::new(),
            endpoint,
            model_name: model_name.to_string(),
            api_key: None,
            think_prefix: None,
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Emit `prefix` as the first token of every stream
    pub fn with_think_prefix(mut self, prefix: Option<String>) -> Self {
        self.think_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// Whole-request timeout for non-streaming completions
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn wire_messages(messages: &[ChatMessage]) -> Result<Vec<WireMessage>, ModelError> {
        let mut wire = Vec::with_capacity(messages.len());
        for message in messages {
            let mut content = Vec::with_capacity(message.content.len());
            for part in &message.content {
                content.push(match part {
                    ContentPart::Text(text) => WirePart::Text { text: text.clone() },
                    ContentPart::ImagePath(path) => WirePart::ImageUrl {
                        image_url: ImageUrl {
                            url: Self::image_data_url(path).await?,
                        },
                    },
                });
            }
            wire.push(WireMessage {
                role: message.role.as_str(),
                content,
            });
        }
        Ok(wire)
    }

    async fn image_data_url(path: &Path) -> Result<String, ModelError> {
        let raw = tokio::fs::read(path).await.map_err(|e| ModelError::Image {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        Ok(format!("data:{};base64,{}", image_mime(path), encoded))
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
        stream: bool,
    ) -> Result<reqwest::Response, ModelError> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: Self::wire_messages(messages).await?,
            stream,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            repetition_penalty: params.repetition_penalty,
            presence_penalty: params.presence_penalty,
            stop: &params.stop,
            include_stop_str_in_output: params.include_stop_str_in_output,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        if let (false, Some(timeout)) = (stream, self.timeout) {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok(response)
    }
}

struct StreamState {
    bytes: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    sse: SseBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

impl StreamState {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Done => {
                    self.finished = true;
                    return;
                }
                SseEvent::Data(data) => match delta_content(&data) {
                    Ok(Some(text)) => self.pending.push_back(text),
                    Ok(None) => {}
                    Err(e) => warn!("Skipping malformed stream chunk ({}): {}", e, data),
                },
            }
        }
    }
}

/// Turn a streamed completion body into text fragments
pub fn token_stream<S>(bytes: S) -> TokenStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        sse: SseBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(token) = state.pending.pop_front() {
                return Some((Ok(token), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.sse.push(&chunk);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(ModelError::Stream(e.to_string())), state));
                }
                None => {
                    let events = state.sse.finish();
                    state.absorb(events);
                    state.finished = true;
                }
            }
        }
    }))
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<TokenStream, ModelError> {
        debug!(
            "Streaming {} messages to {} (stop={:?})",
            messages.len(),
            self.model_name,
            params.stop
        );
        let response = self.send(messages, params, true).await?;
        let tokens = token_stream(response.bytes_stream());

        let tokens: TokenStream = match &self.think_prefix {
            Some(prefix) => {
                let first = stream::once(futures::future::ready(Ok(prefix.clone())));
                Box::pin(first.chain(tokens))
            }
            None => tokens,
        };
        Ok(tokens)
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, ModelError> {
        let start = std::time::Instant::now();
        let response = self.send(messages, params, false).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::InvalidResponse("no completion choices".to_string()))?;

        info!(
            "Completion from {} ({} chars) in {}ms",
            self.model_name,
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
