//! HTTP API tests against an in-process server on an ephemeral port.

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use leadqual::backend::Backend;
use leadqual::server::{router, AppState};
use leadqual_core::embedding::EmbeddingProvider;

use common::*;

async fn start(root: &std::path::Path, embedder: Arc<dyn EmbeddingProvider>) -> String {
    let config = test_config(root, 0);
    let store = Arc::new(sqlite_store(root).await);
    let state = AppState::new(&config, Backend::new(store, embedder));
    spawn_app(router(state)).await
}

async fn start_default(root: &std::path::Path) -> String {
    start(root, Arc::new(KeywordEmbedder)).await
}

async fn add_source(client: &reqwest::Client, base: &str, chatbot: &str, title: &str, content: &str) -> Vec<String> {
    let resp = client
        .post(format!("{}/chatbots/{}/sources", base, chatbot))
        .json(&json!({ "title": title, "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_server_health() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_server_context_similarity() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;
    let client = reqwest::Client::new();
    add_source(&client, &base, "acme", "Pricing", PRICING).await;
    add_source(&client, &base, "acme", "Refunds", REFUND).await;

    let resp = client
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "What does the pro plan cost?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["tier"], "similarity");
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["title"], "Pricing");
    assert!(sources[0]["similarity"].as_f64().unwrap() > 0.5);

    let context = body["context"].as_str().unwrap();
    assert!(context.starts_with("## Knowledge Base"));
    assert!(context.contains(&format!("[Pricing]\n{}", PRICING)));
    assert!(!context.contains("Refund policy"));
}

#[tokio::test]
async fn test_server_context_overrides() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;
    let client = reqwest::Client::new();
    add_source(&client, &base, "acme", "Pricing", PRICING).await;
    add_source(&client, &base, "acme", "Refunds", REFUND).await;

    let resp = client
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "pricing refund", "threshold": 0.3, "limit": 1 }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["title"], "Refunds");
}

#[tokio::test]
async fn test_server_context_blank_query_is_empty() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;
    let client = reqwest::Client::new();
    add_source(&client, &base, "acme", "Pricing", PRICING).await;

    let resp = client
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["tier"], "empty");
    assert_eq!(body["context"], "");
    assert!(body["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_context_embedder_down_degrades() {
    let tmp = TempDir::new().unwrap();
    let base = start(tmp.path(), Arc::new(DownEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "How much is the pro plan?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["tier"], "empty");
    assert_eq!(body["context"], "");
}

#[tokio::test]
async fn test_server_context_rejects_bad_threshold() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "pricing", "threshold": 1.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("threshold"));
}

#[tokio::test]
async fn test_server_context_rejects_zero_limit() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "pricing", "limit": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_server_bant_progress() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/bant/progress", base))
        .json(&json!({
            "messages": [
                { "role": "system", "content": "You are a sales assistant." },
                { "role": "assistant", "content": "Hi there! What's your name?" },
                { "role": "user", "content": "Sam. What's your email?" },
                { "role": "assistant", "content": "Great, thanks! What's the best email to reach you?" },
                { "role": "user", "content": "sam@example.com" },
                { "role": "assistant", "content": "What challenges are you facing with your current software?" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["progress"], 60);
    assert_eq!(body["asked"], json!(["name", "email", "need"]));
}

#[tokio::test]
async fn test_server_bant_empty_transcript() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/bant/progress", base))
        .json(&json!({ "messages": [] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["progress"], 0);
    assert_eq!(body["asked"], json!([]));
}

#[tokio::test]
async fn test_server_source_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;
    let client = reqwest::Client::new();

    let ids = add_source(&client, &base, "acme", "Pricing", PRICING).await;
    add_source(&client, &base, "acme", "Refunds", REFUND).await;
    add_source(&client, &base, "globex", "Shipping", SHIPPING).await;
    assert_eq!(ids.len(), 1);

    let body: Value = client
        .get(format!("{}/chatbots/acme/sources?limit=1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);

    let url = format!("{}/chatbots/acme/sources/{}", base, ids[0]);
    let resp = client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    // other chatbots are untouched
    let body: Value = client
        .get(format!("{}/chatbots/globex/sources", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_server_add_source_blank_content() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/sources", base))
        .json(&json!({ "content": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_server_add_source_embedder_down() {
    let tmp = TempDir::new().unwrap();
    let base = start(tmp.path(), Arc::new(DownEmbedder)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/sources", base))
        .json(&json!({ "title": "Pricing", "content": PRICING }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "embedding_failed");
}

#[tokio::test]
async fn test_server_add_source_blank_chatbot_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/%20/sources", base))
        .json(&json!({ "title": "Pricing", "content": PRICING }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("chatbot id"));
}

#[tokio::test]
async fn test_server_context_rejects_limit_over_max() {
    let tmp = TempDir::new().unwrap();
    let base = start_default(tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chatbots/acme/context", base))
        .json(&json!({ "query": "pricing", "limit": 51 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["message"].as_str().unwrap().contains("limit"));
}
