// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/support/mod.rs - Hand-written fakes shared by the integration suites
#![allow(dead_code)]

use agentic_search_node::model::{
    ChatMessage, ChatModel, GenerationParams, ModelError, TokenStream,
};
use agentic_search_node::search::content::{ContentFetchConfig, ContentFetcher, FetchError, PageExtractor};
use agentic_search_node::search::rate_limiter::SearchRateLimiter;
use agentic_search_node::search::{
    ResultCache, SearchError, SearchHit, SearchProvider, SearchService, Summarizer,
};
use agentic_search_node::workflow::{
    run_workflow, EventSink, InferRequest, Mode, StreamEvent, WorkflowConfig, WorkflowContext,
};
use tokio_util::sync::CancellationToken;
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// What the fake model streams on each call
#[derive(Clone)]
pub enum Script {
    /// One text per call; calls past the end stream nothing
    Rounds(Vec<String>),
    /// The same text on every call
    Repeat(String),
    /// Stream the tokens, then fail
    FailAfter(Vec<String>, String),
    /// Never yields a token
    Hang,
}

pub struct FakeModel {
    script: Script,
    summary: Result<String, String>,
    calls: AtomicUsize,
    completions: AtomicUsize,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeModel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            summary: Ok(String::new()),
            calls: AtomicUsize::new(0),
            completions: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rounds(rounds: &[&str]) -> Self {
        Self::new(Script::Rounds(rounds.iter().map(|s| s.to_string()).collect()))
    }

    /// Fake used as the summarizer backend
    pub fn summarizing(summary: &str) -> Self {
        let mut model = Self::new(Script::Rounds(Vec::new()));
        model.summary = Ok(summary.to_string());
        model
    }

    pub fn failing_summarizer(message: &str) -> Self {
        let mut model = Self::new(Script::Rounds(Vec::new()));
        model.summary = Err(message.to_string());
        model
    }

    pub fn stream_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completion_calls(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    /// Conversations passed to `stream_chat`, in call order
    pub fn conversations(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

/// Split on spaces, keeping the separator with the preceding word
pub fn tokens_of(text: &str) -> Vec<Result<String, ModelError>> {
    text.split_inclusive(' ').map(|t| Ok(t.to_string())).collect()
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<TokenStream, ModelError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());

        let stream: TokenStream = match &self.script {
            Script::Rounds(rounds) => {
                let text = rounds.get(n).cloned().unwrap_or_default();
                Box::pin(stream::iter(tokens_of(&text)))
            }
            Script::Repeat(text) => Box::pin(stream::iter(tokens_of(text))),
            Script::FailAfter(tokens, message) => {
                let mut items: Vec<Result<String, ModelError>> =
                    tokens.iter().map(|t| Ok(t.clone())).collect();
                items.push(Err(ModelError::Stream(message.clone())));
                Box::pin(stream::iter(items))
            }
            Script::Hang => Box::pin(stream::pending::<Result<String, ModelError>>()),
        };
        Ok(stream)
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<String, ModelError> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        self.summary.clone().map_err(ModelError::Request)
    }
}

/// Provider returning the same pages for every query
pub struct FakeProvider {
    hits: Vec<SearchHit>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_urls(urls: &[&str]) -> Self {
        Self::new(
            urls.iter()
                .enumerate()
                .map(|(i, url)| SearchHit {
                    title: format!("Page {}", i + 1),
                    url: url.to_string(),
                    snippet: String::new(),
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Extractor with canned page texts; unknown URLs fail with HTTP 404
pub struct FakeExtractor {
    pages: HashMap<String, String>,
    slow: HashMap<String, Duration>,
    every_page: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
            slow: HashMap::new(),
            every_page: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.slow.insert(url.to_string(), delay);
        self
    }

    /// Delay applied to every URL without its own delay
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.every_page = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most extractions ever running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageExtractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.slow.get(url).copied().or(self.every_page) {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus(404, "not found".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn fetch_config(timeout_secs: u64) -> ContentFetchConfig {
    ContentFetchConfig {
        jina_api_key: None,
        max_concurrent: 5,
        timeout_per_page_secs: timeout_secs,
    }
}

pub fn search_service(
    provider: Arc<FakeProvider>,
    extractor: Arc<FakeExtractor>,
    cache_path: &Path,
) -> SearchService {
    SearchService::new(
        provider,
        ContentFetcher::new(extractor, fetch_config(5)),
        Arc::new(ResultCache::open(cache_path).unwrap()),
        SearchRateLimiter::new(6000),
    )
}

pub fn workflow_context(
    model: Arc<FakeModel>,
    search: SearchService,
    summarizer: Arc<FakeModel>,
) -> WorkflowContext {
    WorkflowContext {
        model,
        search: Arc::new(search),
        summarizer: Arc::new(Summarizer::new(summarizer, 10_000)),
        config: WorkflowConfig::default(),
    }
}

pub async fn collect_events(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Concatenated token contents
pub fn token_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Token { content } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

/// Serve `app` on an ephemeral local port
pub async fn spawn_server(app: axum::Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Run a workflow to its end while draining its events
pub async fn run_to_end(
    mode: Mode,
    ctx: WorkflowContext,
    request: InferRequest,
    cancel: CancellationToken,
) -> Vec<StreamEvent> {
    let (sink, rx) = EventSink::channel(16);
    let worker = tokio::spawn(run_workflow(mode, ctx, request, sink, cancel));
    let events = collect_events(rx).await;
    worker.await.unwrap();
    events
}

/// Router over a registry holding `model` as "fake-model"
pub fn test_app(
    model: Arc<FakeModel>,
    cache_path: &Path,
) -> (axum::Router, Arc<agentic_search_node::api::AppState>) {
    use agentic_search_node::api::{create_app, AppState, TaskRegistry};
    use agentic_search_node::config::ModelEntry;
    use agentic_search_node::model::ModelRegistry;

    let entry = ModelEntry {
        display_name: "Fake Model".to_string(),
        base_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        model_name: "fake/model".to_string(),
        think_prefix: None,
        api_key: None,
    };
    let models = ModelRegistry::new().with_model("fake-model", &entry, model);

    let provider = Arc::new(FakeProvider::with_urls(&["https://a.example/"]));
    let extractor = Arc::new(FakeExtractor::new(&[("https://a.example/", "page a")]));
    let state = Arc::new(AppState {
        models: Arc::new(models),
        search: Arc::new(search_service(provider, extractor, cache_path)),
        summarizer: Arc::new(Summarizer::new(
            Arc::new(FakeModel::summarizing("summary a")),
            10_000,
        )),
        workflow: WorkflowConfig::default(),
        tasks: TaskRegistry::new(),
    });

    (create_app(state.clone()), state)
}

pub const BOUNDARY: &str = "TESTBOUNDARY";

/// multipart/form-data body with text fields then file parts
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
