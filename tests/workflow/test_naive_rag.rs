// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Single-search retrieval-augmented answering

use agentic_search_node::model::ContentPart;
use agentic_search_node::workflow::prompts::SEARCH_STATUS_MESSAGE;
use agentic_search_node::workflow::{FinishReason, InferRequest, Mode, StreamEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::support::{
    run_to_end, search_service, token_text, workflow_context, FakeExtractor, FakeModel,
    FakeProvider,
};

#[tokio::test]
async fn test_search_then_grounded_answer() {
    let dir = TempDir::new().unwrap();
    let model = Arc::new(FakeModel::rounds(&["It is Paris."]));
    let summarizer = Arc::new(FakeModel::summarizing("France's capital is Paris."));
    let provider = Arc::new(FakeProvider::with_urls(&["https://a.example/"]));
    let search = search_service(
        provider.clone(),
        Arc::new(FakeExtractor::new(&[("https://a.example/", "Paris, capital")])),
        &dir.path().join("c.json"),
    );
    let ctx = workflow_context(model.clone(), search, summarizer);

    let request =
        InferRequest::new("capital of France").with_images(vec![PathBuf::from("/tmp/map.png")]);
    let events = run_to_end(Mode::NaiveRag, ctx, request, CancellationToken::new()).await;

    assert_eq!(events[0], StreamEvent::status("search", SEARCH_STATUS_MESSAGE));
    assert_eq!(
        events[1],
        StreamEvent::token("\n<search>capital of France</search>\n")
    );
    assert_eq!(
        events[2],
        StreamEvent::token("\n<search_result>France's capital is Paris.</search_result>\n")
    );
    assert_eq!(token_text(&events[3..]), "It is Paris.");
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Done {
            reason: FinishReason::Complete
        })
    );

    assert_eq!(provider.queries(), vec!["capital of France".to_string()]);

    // One user turn carrying the summary, the question and the image
    let conversation = &model.conversations()[0];
    assert_eq!(conversation.len(), 1);
    let prompt = conversation[0].text();
    assert!(prompt.contains("France's capital is Paris."));
    assert!(prompt.contains("capital of France"));
    assert!(conversation[0]
        .content
        .contains(&ContentPart::ImagePath(PathBuf::from("/tmp/map.png"))));
}
