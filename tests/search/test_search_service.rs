// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Search → fetch → cache orchestration with fake upstreams

use agentic_search_node::search::{is_failure_content, ResultCache};
use std::sync::Arc;
use tempfile::TempDir;

use crate::support::{search_service, FakeExtractor, FakeProvider};

const URLS: [&str; 3] = [
    "https://a.example/",
    "https://b.example/",
    "https://c.example/",
];

fn pages() -> FakeExtractor {
    FakeExtractor::new(&[
        ("https://a.example/", "text a"),
        ("https://b.example/", "text b"),
    ])
}

#[tokio::test]
async fn test_results_keep_provider_order_with_content() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::with_urls(&URLS));
    let service = search_service(provider, Arc::new(pages()), &dir.path().join("c.json"));

    let results = service.search_and_fetch("q", 3).await;

    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, URLS.to_vec());
    assert_eq!(results[0].content, "text a");
    assert_eq!(results[1].content, "text b");
    assert!(is_failure_content(&results[2].content));
}

#[tokio::test]
async fn test_second_call_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::with_urls(&URLS));
    let extractor = Arc::new(pages());
    let service = search_service(provider.clone(), extractor.clone(), &dir.path().join("c.json"));

    let first = service.search_and_fetch("capital of France", 3).await;
    let second = service.search_and_fetch("capital of France", 2).await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(extractor.calls(), 3);
    assert_eq!(second, first[..2].to_vec());
}

#[tokio::test]
async fn test_larger_top_k_refreshes_entry() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::with_urls(&URLS));
    let cache_path = dir.path().join("c.json");
    let service = search_service(provider.clone(), Arc::new(pages()), &cache_path);

    service.search_and_fetch("q", 1).await;
    let wider = service.search_and_fetch("q", 3).await;

    assert_eq!(provider.calls(), 2);
    assert_eq!(wider.len(), 3);
    let persisted = ResultCache::open(&cache_path).unwrap();
    assert_eq!(persisted.get("q", 3).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_no_hits_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let cache_path = dir.path().join("c.json");
    let service = search_service(provider.clone(), Arc::new(pages()), &cache_path);

    assert!(service.search_and_fetch("nothing", 5).await.is_empty());
    assert!(service.search_and_fetch("nothing", 5).await.is_empty());

    assert_eq!(provider.calls(), 2);
    assert!(!cache_path.exists());
}
