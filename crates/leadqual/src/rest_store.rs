//! [`SourceStore`] over the hosted database's PostgREST API.
//!
//! The hosted Postgres instance keeps sources in a `sources` table with a
//! pgvector `embedding` column and exposes a `match_sources` SQL function
//! for similarity search. This client maps each store operation onto one
//! REST call:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `match_sources` | `POST /rest/v1/rpc/match_sources` |
//! | `list_sources` | `GET /rest/v1/sources?chatbot_id=eq.{id}&limit={n}` |
//! | `insert_source` | `POST /rest/v1/sources` |
//! | `delete_source` | `DELETE /rest/v1/sources?chatbot_id=eq.{c}&id=eq.{id}` |
//! | `delete_chatbot_sources` | `DELETE /rest/v1/sources?chatbot_id=eq.{c}` |
//! | `count_sources` | `GET /rest/v1/sources?chatbot_id=eq.{c}&select=id` |
//!
//! Non-2xx responses become errors carrying the response body, which is
//! what lets the retriever fall back when `match_sources` is missing.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

use leadqual_core::models::{NewSource, Source};
use leadqual_core::store::SourceStore;

use crate::config::StoreConfig;

/// PostgREST client for the `sources` table.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

impl RestStore {
    /// Create a client for `base_url` (e.g. `https://xyz.supabase.co`).
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build from `[store]` config. The API key is read from the
    /// environment variable named by `store.api_key_env`, if set.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .context("store.url required for the rest backend")?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "no API key in environment; requests will be anonymous"
            );
        }
        Self::new(url, api_key, Duration::from_secs(config.timeout_secs))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = self
            .authed(req)
            .send()
            .await
            .with_context(|| format!("{} request failed", what))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{} failed with {}: {}", what, status, body);
        }
        Ok(resp)
    }
}

#[async_trait]
impl SourceStore for RestStore {
    async fn match_sources(
        &self,
        chatbot_id: &str,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<Source>> {
        let body = serde_json::json!({
            "query_embedding": query_vec,
            "match_chatbot_id": chatbot_id,
            "match_threshold": threshold,
            "match_count": limit,
        });
        let req = self.client.post(self.endpoint("rpc/match_sources")).json(&body);
        let resp = self.send(req, "match_sources").await?;
        let mut sources: Vec<Source> = resp
            .json()
            .await
            .context("invalid match_sources response")?;
        sources.truncate(limit);
        Ok(sources)
    }

    async fn list_sources(&self, chatbot_id: &str, limit: usize) -> Result<Vec<Source>> {
        let req = self.client.get(self.endpoint("sources")).query(&[
            ("select", "id,title,content".to_string()),
            ("chatbot_id", format!("eq.{}", chatbot_id)),
            ("limit", limit.to_string()),
        ]);
        let resp = self.send(req, "list sources").await?;
        let mut sources: Vec<Source> = resp.json().await.context("invalid sources listing")?;
        for s in &mut sources {
            s.similarity = None;
        }
        sources.truncate(limit);
        Ok(sources)
    }

    async fn insert_source(&self, source: &NewSource) -> Result<String> {
        let body = serde_json::json!({
            "chatbot_id": source.chatbot_id,
            "title": source.title,
            "content": source.content,
            "embedding": source.embedding,
        });
        let req = self
            .client
            .post(self.endpoint("sources"))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(&body);
        let resp = self.send(req, "insert source").await?;
        let rows: Vec<IdRow> = resp.json().await.context("invalid insert response")?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.id),
            None => bail!("insert source returned no rows"),
        }
    }

    async fn delete_source(&self, chatbot_id: &str, id: &str) -> Result<bool> {
        let req = self
            .client
            .delete(self.endpoint("sources"))
            .query(&[
                ("select", "id".to_string()),
                ("chatbot_id", format!("eq.{}", chatbot_id)),
                ("id", format!("eq.{}", id)),
            ])
            .header("Prefer", "return=representation");
        let resp = self.send(req, "delete source").await?;
        let rows: Vec<IdRow> = resp.json().await.context("invalid delete response")?;
        Ok(!rows.is_empty())
    }

    async fn delete_chatbot_sources(&self, chatbot_id: &str) -> Result<u64> {
        let req = self
            .client
            .delete(self.endpoint("sources"))
            .query(&[
                ("select", "id".to_string()),
                ("chatbot_id", format!("eq.{}", chatbot_id)),
            ])
            .header("Prefer", "return=representation");
        let resp = self.send(req, "delete chatbot sources").await?;
        let rows: Vec<IdRow> = resp.json().await.context("invalid delete response")?;
        Ok(rows.len() as u64)
    }

    async fn count_sources(&self, chatbot_id: &str) -> Result<u64> {
        let req = self.client.get(self.endpoint("sources")).query(&[
            ("select", "id".to_string()),
            ("chatbot_id", format!("eq.{}", chatbot_id)),
        ]);
        let resp = self.send(req, "count sources").await?;
        let rows: Vec<IdRow> = resp.json().await.context("invalid count response")?;
        Ok(rows.len() as u64)
    }
}
