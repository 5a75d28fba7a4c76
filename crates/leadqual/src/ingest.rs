//! Knowledge-base ingestion: text → chunks → embeddings → sources.
//!
//! Embeddings are computed once here and stored with each source; they
//! are never recomputed afterwards. A document that splits into several
//! chunks becomes several sources titled `"{title} (part N)"`.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use leadqual_core::chunk::split_into_chunks;
use leadqual_core::embedding::EmbeddingProvider;
use leadqual_core::models::NewSource;
use leadqual_core::store::SourceStore;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Ids of the created sources, in chunk order.
    pub ids: Vec<String>,
}

/// Why an ingestion request was refused, carried inside the returned
/// `anyhow::Error` (recover it with `downcast_ref`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestRejection {
    /// The chatbot id is blank.
    EmptyChatbotId,
    /// The text produced no chunks.
    EmptyContent,
    /// The embedding provider failed; nothing was stored.
    EmbeddingFailed,
}

impl fmt::Display for IngestRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestRejection::EmptyChatbotId => write!(f, "chatbot id must not be empty"),
            IngestRejection::EmptyContent => write!(f, "nothing to ingest: content is empty"),
            IngestRejection::EmbeddingFailed => write!(f, "failed to embed source content"),
        }
    }
}

impl std::error::Error for IngestRejection {}

/// Chunk, embed, and store `text` as sources owned by `chatbot_id`.
///
/// All chunks are embedded in one batch before anything is written, so a
/// provider failure leaves the store untouched.
pub async fn ingest_text<S, E>(
    store: &S,
    embedder: &E,
    chatbot_id: &str,
    title: Option<&str>,
    text: &str,
    max_tokens: usize,
) -> Result<IngestReport>
where
    S: SourceStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    if chatbot_id.trim().is_empty() {
        return Err(IngestRejection::EmptyChatbotId.into());
    }

    let chunks = split_into_chunks(text, max_tokens);
    if chunks.is_empty() {
        return Err(IngestRejection::EmptyContent.into());
    }

    let vectors = embedder
        .embed_batch(&chunks)
        .await
        .context(IngestRejection::EmbeddingFailed)?;
    if vectors.len() != chunks.len() {
        bail!(
            "embedding provider returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        );
    }

    let total = chunks.len();
    let mut ids = Vec::with_capacity(total);
    for (i, (content, embedding)) in chunks.into_iter().zip(vectors).enumerate() {
        let chunk_title = match title {
            Some(t) if total > 1 => Some(format!("{} (part {})", t, i + 1)),
            Some(t) => Some(t.to_string()),
            None => None,
        };
        let id = store
            .insert_source(&NewSource {
                chatbot_id: chatbot_id.to_string(),
                title: chunk_title,
                content,
                embedding,
            })
            .await?;
        ids.push(id);
    }

    tracing::info!(chatbot_id, sources = ids.len(), "ingested knowledge source");
    Ok(IngestReport { ids })
}

/// Ingest a UTF-8 text file, using its file name as the title unless one
/// is given.
pub async fn ingest_file<S, E>(
    store: &S,
    embedder: &E,
    chatbot_id: &str,
    path: &Path,
    title: Option<&str>,
    max_tokens: usize,
) -> Result<IngestReport>
where
    S: SourceStore + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let title = title.map(str::to_string).or(file_name);
    ingest_text(store, embedder, chatbot_id, title.as_deref(), &text, max_tokens).await
}
