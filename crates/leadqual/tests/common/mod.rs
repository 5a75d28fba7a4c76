//! Shared fixtures for the leadqual integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::Path;

use leadqual::config::{parse_config, Config};
use leadqual::sqlite_store::SqliteStore;
use leadqual::{db, migrate};
use leadqual_core::embedding::EmbeddingProvider;

/// Words the keyword embedder knows; one dimension per word.
pub const VOCAB: &[&str] = &[
    "pricing", "plan", "cost", "refund", "policy", "shipping", "support", "hours",
];

/// Count vocabulary words in `text`, case-insensitively.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCAB.len()];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
    {
        if let Some(i) = VOCAB.iter().position(|w| *w == word) {
            v[i] += 1.0;
        }
    }
    v
}

/// Deterministic bag-of-words embedder, so similarity scores in tests
/// are predictable without a network provider.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dims(&self) -> usize {
        VOCAB.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }
}

/// Embedder that always fails, like a provider that is down.
pub struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    fn model_name(&self) -> &str {
        "down"
    }

    fn dims(&self) -> usize {
        VOCAB.len()
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("connection refused")
    }
}

pub const PRICING: &str = "Pricing: the pro plan cost is 49 dollars per month.";
pub const REFUND: &str = "Refund policy: full refund within 30 days.";
pub const SHIPPING: &str = "Shipping takes 3 days. Support hours are 9 to 5.";

/// Config text with a database under `root`, bound to `port`.
pub fn config_toml(root: &Path, port: u16) -> String {
    format!(
        r#"[db]
path = "{}/data/lq.sqlite"

[retrieval]
limit = 5
threshold = 0.5

[chunking]
max_tokens = 500

[server]
bind = "127.0.0.1:{}"
"#,
        root.display(),
        port
    )
}

pub fn test_config(root: &Path, port: u16) -> Config {
    parse_config(&config_toml(root, port)).unwrap()
}

/// Open a migrated SQLite store under `root`.
pub async fn sqlite_store(root: &Path) -> SqliteStore {
    let config = test_config(root, 0);
    let pool = db::connect(&config).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    SqliteStore::new(pool)
}

/// Find an available port for a test server.
pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Serve `app` on an ephemeral port in the background; returns its base URL.
pub async fn spawn_app(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
