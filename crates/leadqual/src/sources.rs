//! Knowledge-source management commands.
//!
//! Backs `lq source add|list|remove|clear`. The HTTP server exposes the
//! same operations under `/chatbots/{id}/sources`.
//!
//! # Usage
//!
//! ```bash
//! lq source add acme-bot ./docs/pricing.md
//! lq source list acme-bot --limit 20
//! lq source remove acme-bot 550e8400-e29b-41d4-a716-446655440000
//! lq source clear acme-bot
//! ```

use anyhow::{bail, Result};
use std::path::Path;

use crate::backend::Backend;
use crate::config::Config;
use crate::ingest::ingest_file;

/// CLI entry point for `lq source add`.
pub async fn run_add(
    config: &Config,
    chatbot_id: &str,
    path: &Path,
    title: Option<&str>,
) -> Result<()> {
    let backend = Backend::open(config).await?;
    let report = ingest_file(
        backend.store.as_ref(),
        backend.embedder.as_ref(),
        chatbot_id,
        path,
        title,
        config.chunking.max_tokens,
    )
    .await?;

    println!("added sources: {}", report.ids.len());
    for id in &report.ids {
        println!("  {}", id);
    }
    Ok(())
}

/// CLI entry point for `lq source list`.
pub async fn run_list(config: &Config, chatbot_id: &str, limit: usize) -> Result<()> {
    let backend = Backend::open(config).await?;
    let total = backend.store.count_sources(chatbot_id).await?;
    let sources = backend.store.list_sources(chatbot_id, limit).await?;

    println!("sources for {}: {}", chatbot_id, total);
    for s in &sources {
        let preview: String = s.content.chars().take(72).collect();
        println!(
            "{}  {:<32}  {}",
            s.id,
            s.title.as_deref().unwrap_or("(untitled)"),
            preview.replace('\n', " ")
        );
    }
    Ok(())
}

/// CLI entry point for `lq source remove`.
pub async fn run_remove(config: &Config, chatbot_id: &str, id: &str) -> Result<()> {
    let backend = Backend::open(config).await?;
    if !backend.store.delete_source(chatbot_id, id).await? {
        bail!("source not found: {}", id);
    }
    println!("removed source {}", id);
    Ok(())
}

/// CLI entry point for `lq source clear`.
pub async fn run_clear(config: &Config, chatbot_id: &str) -> Result<()> {
    let backend = Backend::open(config).await?;
    let removed = backend.store.delete_chatbot_sources(chatbot_id).await?;
    println!("removed sources: {}", removed);
    Ok(())
}
