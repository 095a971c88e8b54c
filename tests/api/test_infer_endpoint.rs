// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! /infer endpoint tests
//!
//! Validation failures answer 400 before any streaming starts; accepted
//! requests stream JSON events over SSE ending in exactly one terminal event.

use agentic_search_node::api::TASK_ID_HEADER;
use agentic_search_node::model::ContentPart;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use crate::support::{multipart_body, test_app, FakeModel, BOUNDARY};

pub fn infer_request(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/infer")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap()
}

/// JSON payloads of every `data:` line
pub fn sse_events(raw: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(raw)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect()
}

async fn error_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod infer_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_model_is_400() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(Arc::new(FakeModel::rounds(&[])), &dir.path().join("c.json"));

        let response = app
            .oneshot(infer_request(
                &[("query", "q"), ("model", "gpt-x"), ("mode", "direct_reasoning")],
                &[],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = error_body(response).await;
        assert_eq!(body["error"], "Unknown model: gpt-x");
        assert_eq!(body["details"]["available_models"][0], "fake-model");
    }

    #[tokio::test]
    async fn test_unknown_mode_is_400() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(Arc::new(FakeModel::rounds(&[])), &dir.path().join("c.json"));

        let response = app
            .oneshot(infer_request(
                &[("query", "q"), ("model", "fake-model"), ("mode", "deep_research")],
                &[],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await["error"], "Unknown mode: deep_research");
    }

    #[tokio::test]
    async fn test_missing_query_is_400() {
        let dir = TempDir::new().unwrap();
        let (app, _) = test_app(Arc::new(FakeModel::rounds(&[])), &dir.path().join("c.json"));

        let response = app
            .oneshot(infer_request(
                &[("query", "  "), ("model", "fake-model"), ("mode", "naive_rag")],
                &[],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await["details"]["field"], "query");
    }

    #[tokio::test]
    async fn test_agentic_stream_over_sse() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FakeModel::rounds(&[
            "<search>capital of France</search>",
            "Paris.",
        ]));
        let (app, state) = test_app(model, &dir.path().join("c.json"));

        let response = app
            .oneshot(infer_request(
                &[
                    ("query", "What is the capital of France?"),
                    ("model", "fake-model"),
                    ("mode", "agentic_search"),
                    ("task_id", "task-42"),
                ],
                &[],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[TASK_ID_HEADER], "task-42");
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let raw = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events = sse_events(&raw);

        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(kinds.last(), Some(&"done"));
        assert_eq!(kinds.iter().filter(|k| **k == "done" || **k == "error").count(), 1);
        assert_eq!(events.last().unwrap()["reason"], "complete");
        assert!(events
            .iter()
            .any(|e| e["content"] == "\n<search_result>summary a</search_result>\n"));
        assert!(!state.tasks.contains("task-42").await);
    }

    #[tokio::test]
    async fn test_uploaded_images_reach_the_model() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FakeModel::rounds(&["A cat."]));
        let (app, _) = test_app(model.clone(), &dir.path().join("c.json"));

        let response = app
            .oneshot(infer_request(
                &[
                    ("query", "What is in the picture?"),
                    ("model", "fake-model"),
                    ("mode", "direct_reasoning"),
                ],
                &[("cat.png", &b"\x89PNG fake"[..]), ("", &b""[..])],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // Generated task ids are uuids
        let task_id = response.headers()[TASK_ID_HEADER].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&task_id).is_ok());

        let raw = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let events = sse_events(&raw);
        assert_eq!(events[0]["content"], "A ");
        assert_eq!(events.last().unwrap()["type"], "done");

        let images: Vec<_> = model.conversations()[0][0]
            .content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ImagePath(path) => Some(path.clone()),
                ContentPart::Text(_) => None,
            })
            .collect();
        assert_eq!(images.len(), 1);
        assert!(images[0].to_string_lossy().ends_with("_cat.png"));
        // Upload directory is removed once the request is done
        assert!(!images[0].exists());
    }
}
