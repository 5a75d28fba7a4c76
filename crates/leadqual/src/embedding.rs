//! Embedding provider implementations.
//!
//! Concrete backends for the [`EmbeddingProvider`] trait:
//! - **[`DisabledProvider`]**: always fails; retrieval then returns no sources.
//! - **[`OpenAIProvider`]**: `POST /v1/embeddings` on OpenAI or any compatible gateway.
//! - **[`OllamaProvider`]**: `POST /api/embed` on a local Ollama instance.
//!
//! Use [`create_provider`] to instantiate the configured backend.
//!
//! # Retry Strategy
//!
//! Query embeddings ([`EmbeddingProvider::embed`]) run on the conversation
//! path and make exactly one attempt, bounded by `embedding.timeout_secs`.
//! Ingestion batches ([`EmbeddingProvider::embed_batch`]) retry transient
//! errors with exponential backoff:
//! - HTTP 429 and 5xx → retry
//! - other 4xx → fail immediately
//! - network errors → retry
//! - backoff: 1s, 2s, 4s, ... capped at 32s, up to `embedding.max_retries`

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub use leadqual_core::embedding::EmbeddingProvider;

use crate::config::EmbeddingConfig;

/// Create the embedding provider selected by `config.provider`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledProvider)),
        "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A provider that refuses to embed.
///
/// Used when `embedding.provider = "disabled"`. Chatbots keep working;
/// they simply get no knowledge-base context.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ Shared HTTP plumbing ============

fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST `body` to `url`, retrying 429/5xx/network errors up to `max_retries`.
async fn post_with_retry(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
    max_retries: u32,
    service: &str,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::debug!(service, attempt, ?delay, "retrying embedding request");
            tokio::time::sleep(delay).await;
        }

        let mut req = client.post(url).json(body);
        if let Some(key) = bearer {
            req = req.bearer_auth(key);
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow!("{} API error {}: {}", service, status, body_text));
                    continue;
                }
                bail!("{} API error {}: {}", service, status, body_text);
            }
            Err(e) => {
                last_err = Some(anyhow!("{} connection error: {}", service, e));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("{} embedding failed after retries", service)))
}

fn check_dims(vectors: &[Vec<f32>], dims: usize) -> Result<()> {
    if let Some(v) = vectors.iter().find(|v| v.len() != dims) {
        bail!(
            "embedding has {} dimensions, expected {} (check embedding.dims)",
            v.len(),
            dims
        );
    }
    Ok(())
}

fn parse_f32_array(value: &serde_json::Value) -> Option<Vec<f32>> {
    value
        .as_array()
        .map(|arr| arr.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect())
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI embeddings API.
///
/// Requires `OPENAI_API_KEY` in the environment. `embedding.url` may point
/// at any OpenAI-compatible gateway (default `https://api.openai.com/v1`).
pub struct OpenAIProvider {
    model: String,
    dims: usize,
    url: String,
    api_key: String,
    max_retries: u32,
    client: Client,
}

impl OpenAIProvider {
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is not set, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .context("embedding.model required for OpenAI provider")?;
        let dims = config
            .dims
            .context("embedding.dims required for OpenAI provider")?;
        let api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable not set")?;
        let base = config
            .url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            model,
            dims,
            url: format!("{}/embeddings", base.trim_end_matches('/')),
            api_key,
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }

    async fn request(&self, texts: &[String], max_retries: u32) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = post_with_retry(
            &self.client,
            &self.url,
            Some(&self.api_key),
            &body,
            max_retries,
            "OpenAI",
        )
        .await?;
        let vectors = parse_openai_response(&json)?;
        if vectors.len() != texts.len() {
            bail!(
                "OpenAI returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            );
        }
        check_dims(&vectors, self.dims)?;
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text.to_string()], 0)
            .await?
            .into_iter()
            .next()
            .context("Empty embedding response")
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts, self.max_retries).await
    }
}

/// Parse an OpenAI embeddings response, ordering vectors by `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .context("Invalid OpenAI response: missing data array")?;

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let vec = item
            .get("embedding")
            .and_then(parse_f32_array)
            .context("Invalid OpenAI response: missing embedding")?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        indexed.push((index, vec));
    }
    indexed.sort_by_key(|(i, _)| *i);

    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Calls `POST {url}/api/embed` (default `http://localhost:11434`).
pub struct OllamaProvider {
    model: String,
    dims: usize,
    url: String,
    max_retries: u32,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .context("embedding.model required for Ollama provider")?;
        let dims = config
            .dims
            .context("embedding.dims required for Ollama provider")?;
        let base = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model,
            dims,
            url: format!("{}/api/embed", base.trim_end_matches('/')),
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }

    async fn request(&self, texts: &[String], max_retries: u32) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json =
            post_with_retry(&self.client, &self.url, None, &body, max_retries, "Ollama").await?;
        let vectors = parse_ollama_response(&json)?;
        check_dims(&vectors, self.dims)?;
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text.to_string()], 0)
            .await?
            .into_iter()
            .next()
            .context("Empty embedding response")
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts, self.max_retries).await
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .context("Invalid Ollama response: missing embeddings array")?;

    embeddings
        .iter()
        .map(|e| parse_f32_array(e).context("Invalid Ollama response: embedding is not an array"))
        .collect()
}
