//! Retrieval-augmented generation (RAG) source retrieval.
//!
//! Finds the knowledge-base sources most relevant to the visitor's latest
//! message. Retrieval runs on every conversation turn, so it must never
//! fail the turn: every error is logged and absorbed, and the caller only
//! ever sees a (possibly empty) list of sources.
//!
//! # Tiers
//!
//! After the query is embedded, the store is asked in order:
//!
//! 1. [`Tier::Similarity`]: `match_sources` with threshold and limit.
//! 2. [`Tier::Fallback`]: `list_sources` with the same limit, no scores.
//!    Only tried when the similarity search *errors*; a successful search
//!    that finds nothing above the threshold is an answer, not a failure.
//!
//! If the embedding call fails, or every tier fails, the result is empty
//! ([`Tier::Empty`]). Nothing is retried.

use serde::Serialize;

use crate::embedding::EmbeddingProvider;
use crate::models::Source;
use crate::store::SourceStore;

/// Default maximum number of sources returned.
pub const DEFAULT_LIMIT: usize = 5;
/// Default minimum similarity for a source to be returned.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Retrieval tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Maximum number of sources to return.
    pub limit: usize,
    /// Minimum similarity in `[0.0, 1.0]` for the similarity tier.
    pub threshold: f64,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Which tier produced the returned sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Ranked similarity search results.
    Similarity,
    /// Unordered listing after the similarity search failed.
    Fallback,
    /// Nothing to return.
    Empty,
}

/// Pipeline stage at which a failure was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Embedding,
    Similarity,
    Fallback,
}

/// A failure absorbed during retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct TierFailure {
    pub stage: Stage,
    pub message: String,
}

/// Sources plus a record of how they were obtained.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    pub sources: Vec<Source>,
    pub tier: Tier,
    pub failures: Vec<TierFailure>,
}

impl RetrievalOutcome {
    fn empty(failures: Vec<TierFailure>) -> Self {
        Self {
            sources: Vec::new(),
            tier: Tier::Empty,
            failures,
        }
    }
}

/// Retrieve the sources most relevant to `query` for a chatbot.
///
/// Returns at most `params.limit` sources. Never fails; see the module
/// docs for the degradation order.
pub async fn retrieve_relevant_sources<S, E>(
    store: &S,
    embedder: &E,
    chatbot_id: &str,
    query: &str,
    params: &RetrievalParams,
) -> Vec<Source>
where
    S: SourceStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    retrieve_with_outcome(store, embedder, chatbot_id, query, params)
        .await
        .sources
}

/// Like [`retrieve_relevant_sources`], but reports which tier answered and
/// which failures were absorbed along the way.
pub async fn retrieve_with_outcome<S, E>(
    store: &S,
    embedder: &E,
    chatbot_id: &str,
    query: &str,
    params: &RetrievalParams,
) -> RetrievalOutcome
where
    S: SourceStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let mut failures = Vec::new();

    if params.limit == 0 || query.trim().is_empty() {
        return RetrievalOutcome::empty(failures);
    }

    let query_vec = match embedder.embed(query).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(chatbot_id, error = %e, "query embedding failed; continuing without sources");
            failures.push(TierFailure {
                stage: Stage::Embedding,
                message: e.to_string(),
            });
            return RetrievalOutcome::empty(failures);
        }
    };

    for tier in [Tier::Similarity, Tier::Fallback] {
        let (stage, attempt) = match tier {
            Tier::Similarity => (
                Stage::Similarity,
                store
                    .match_sources(chatbot_id, &query_vec, params.threshold, params.limit)
                    .await,
            ),
            Tier::Fallback => (
                Stage::Fallback,
                store.list_sources(chatbot_id, params.limit).await,
            ),
            Tier::Empty => break,
        };

        match attempt {
            Ok(mut sources) => {
                sources.truncate(params.limit);
                tracing::debug!(chatbot_id, ?tier, count = sources.len(), "retrieved sources");
                if sources.is_empty() {
                    return RetrievalOutcome::empty(failures);
                }
                return RetrievalOutcome {
                    sources,
                    tier,
                    failures,
                };
            }
            Err(e) => {
                tracing::warn!(chatbot_id, ?stage, error = %e, "source retrieval tier failed");
                failures.push(TierFailure {
                    stage,
                    message: e.to_string(),
                });
            }
        }
    }

    RetrievalOutcome::empty(failures)
}
