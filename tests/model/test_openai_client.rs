// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// OpenAI-compatible client against a local stand-in for vLLM

use agentic_search_node::model::{
    ChatMessage, ChatModel, GenerationParams, ModelError, OpenAiCompatClient,
};
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};

use crate::support::spawn_server;

const API_KEY: &str = "secret";

fn chunk(text: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {"content": text}}]})
    )
}

async fn fake_vllm(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if auth != Some("Bearer secret") {
        return (StatusCode::UNAUTHORIZED, "missing api key").into_response();
    }

    if body["stream"] == true {
        let sse = [
            chunk("Paris"),
            chunk(" is the capital."),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        return ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response();
    }

    let question = body["messages"][0]["content"][0]["text"]
        .as_str()
        .unwrap_or_default();
    Json(json!({
        "id": "cmpl-1",
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("summary of: {}", question)},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn client_for(app: Router) -> OpenAiCompatClient {
    let addr = spawn_server(app).await;
    OpenAiCompatClient::new(&format!("http://{}/v1/", addr), "qwen/qwq-32b")
}

fn vllm() -> Router {
    Router::new().route("/v1/chat/completions", post(fake_vllm))
}

fn question() -> Vec<ChatMessage> {
    vec![ChatMessage::user("What is the capital of France?", &[])]
}

#[tokio::test]
async fn test_stream_chat_yields_deltas() {
    let client = client_for(vllm())
        .await
        .with_api_key(Some(API_KEY.to_string()));

    let tokens: Vec<String> = client
        .stream_chat(&question(), &GenerationParams::default())
        .await
        .unwrap()
        .map(|t| t.unwrap())
        .collect()
        .await;

    assert_eq!(tokens, vec!["Paris", " is the capital."]);
}

#[tokio::test]
async fn test_think_prefix_is_first_token() {
    let client = client_for(vllm())
        .await
        .with_api_key(Some(API_KEY.to_string()))
        .with_think_prefix(Some("<think>\n".to_string()));

    let tokens: Vec<String> = client
        .stream_chat(&question(), &GenerationParams::default())
        .await
        .unwrap()
        .map(|t| t.unwrap())
        .collect()
        .await;

    assert_eq!(tokens, vec!["<think>\n", "Paris", " is the capital."]);
}

#[tokio::test]
async fn test_complete_reads_first_choice() {
    let client = client_for(vllm())
        .await
        .with_api_key(Some(API_KEY.to_string()));

    let text = client
        .complete(&question(), &GenerationParams::backend_defaults())
        .await
        .unwrap();

    assert_eq!(text, "summary of: What is the capital of France?");
}

#[tokio::test]
async fn test_missing_bearer_key_is_rejected() {
    let client = client_for(vllm()).await;

    let result = client
        .complete(&question(), &GenerationParams::backend_defaults())
        .await;

    match result {
        Err(ModelError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "missing api key");
        }
        other => panic!("expected 401, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_success_status_fails_stream_before_first_token() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::BAD_GATEWAY, "down") }),
    );
    let client = client_for(app).await;

    let Err(err) = client
        .stream_chat(&question(), &GenerationParams::default())
        .await
    else {
        panic!("a 502 must fail the call");
    };

    assert!(matches!(
        err,
        ModelError::Status { status: 502, ref body } if body == "down"
    ));
}

#[tokio::test]
async fn test_empty_choices_is_invalid_response() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let client = client_for(app).await;

    let result = client
        .complete(&question(), &GenerationParams::backend_defaults())
        .await;

    assert!(matches!(result, Err(ModelError::InvalidResponse(_))));
}
