//! Source store abstraction.
//!
//! The [`SourceStore`] trait covers everything the retrieval and ingestion
//! pipelines need from the knowledge-base table, enabling pluggable
//! backends (SQLite, the hosted database's REST API, in-memory).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Every operation is scoped to a single chatbot: sources are owned by
//! exactly one chatbot and never visible to another.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewSource, Source};

/// Abstract knowledge-base storage.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`match_sources`](SourceStore::match_sources) | Similarity search with threshold and limit |
/// | [`list_sources`](SourceStore::list_sources) | Unordered listing, no similarity |
/// | [`insert_source`](SourceStore::insert_source) | Store a newly ingested source |
/// | [`delete_source`](SourceStore::delete_source) | Remove one source |
/// | [`delete_chatbot_sources`](SourceStore::delete_chatbot_sources) | Remove all of a chatbot's sources |
/// | [`count_sources`](SourceStore::count_sources) | Number of sources for a chatbot |
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Return up to `limit` sources whose similarity to `query_vec` is at
    /// least `threshold`, ordered by descending similarity, with
    /// [`Source::similarity`] populated.
    async fn match_sources(
        &self,
        chatbot_id: &str,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<Source>>;

    /// Return up to `limit` sources for the chatbot in no particular order,
    /// without similarity scores.
    async fn list_sources(&self, chatbot_id: &str, limit: usize) -> Result<Vec<Source>>;

    /// Store a new source, returning its generated id.
    async fn insert_source(&self, source: &NewSource) -> Result<String>;

    /// Delete one source. Returns `false` if it did not exist.
    async fn delete_source(&self, chatbot_id: &str, id: &str) -> Result<bool>;

    /// Delete every source owned by the chatbot, returning how many went.
    async fn delete_chatbot_sources(&self, chatbot_id: &str) -> Result<u64>;

    /// Number of sources owned by the chatbot.
    async fn count_sources(&self, chatbot_id: &str) -> Result<u64>;
}
