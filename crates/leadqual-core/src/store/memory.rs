//! In-memory [`SourceStore`] implementation for tests and embedders.
//!
//! Sources live in a `Vec` behind `std::sync::RwLock`. Similarity search
//! is brute-force cosine similarity over the chatbot's stored vectors.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{NewSource, Source};

use super::SourceStore;

struct StoredSource {
    id: String,
    chatbot_id: String,
    title: Option<String>,
    content: String,
    embedding: Vec<f32>,
}

impl StoredSource {
    fn to_source(&self, similarity: Option<f64>) -> Source {
        Source {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            similarity,
        }
    }
}

/// In-memory store for tests and single-process use.
pub struct InMemoryStore {
    sources: RwLock<Vec<StoredSource>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory source store lock poisoned")
}

#[async_trait]
impl SourceStore for InMemoryStore {
    async fn match_sources(
        &self,
        chatbot_id: &str,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<Source>> {
        let sources = self.sources.read().map_err(poisoned)?;
        let mut scored: Vec<(f64, &StoredSource)> = sources
            .iter()
            .filter(|s| s.chatbot_id == chatbot_id)
            .map(|s| (cosine_similarity(query_vec, &s.embedding) as f64, s))
            .filter(|(sim, _)| *sim >= threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored
            .into_iter()
            .map(|(sim, s)| s.to_source(Some(sim)))
            .collect())
    }

    async fn list_sources(&self, chatbot_id: &str, limit: usize) -> Result<Vec<Source>> {
        let sources = self.sources.read().map_err(poisoned)?;
        Ok(sources
            .iter()
            .filter(|s| s.chatbot_id == chatbot_id)
            .take(limit)
            .map(|s| s.to_source(None))
            .collect())
    }

    async fn insert_source(&self, source: &NewSource) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sources = self.sources.write().map_err(poisoned)?;
        sources.push(StoredSource {
            id: id.clone(),
            chatbot_id: source.chatbot_id.clone(),
            title: source.title.clone(),
            content: source.content.clone(),
            embedding: source.embedding.clone(),
        });
        Ok(id)
    }

    async fn delete_source(&self, chatbot_id: &str, id: &str) -> Result<bool> {
        let mut sources = self.sources.write().map_err(poisoned)?;
        let before = sources.len();
        sources.retain(|s| !(s.chatbot_id == chatbot_id && s.id == id));
        Ok(sources.len() != before)
    }

    async fn delete_chatbot_sources(&self, chatbot_id: &str) -> Result<u64> {
        let mut sources = self.sources.write().map_err(poisoned)?;
        let before = sources.len();
        sources.retain(|s| s.chatbot_id != chatbot_id);
        Ok((before - sources.len()) as u64)
    }

    async fn count_sources(&self, chatbot_id: &str) -> Result<u64> {
        let sources = self.sources.read().map_err(poisoned)?;
        Ok(sources.iter().filter(|s| s.chatbot_id == chatbot_id).count() as u64)
    }
}
