//! `lq retrieve`: run the retrieval pipeline from the command line.
//!
//! Useful for tuning `retrieval.threshold` against a real knowledge base:
//! prints which tier answered, every absorbed failure, and the ranked
//! sources (or, with `--context`, the exact prompt section the model
//! would receive).

use anyhow::Result;

use leadqual_core::context::build_source_context;
use leadqual_core::retrieve::{retrieve_with_outcome, Tier};

use crate::backend::Backend;
use crate::config::Config;

/// CLI entry point for `lq retrieve`.
pub async fn run_retrieve(
    config: &Config,
    chatbot_id: &str,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f64>,
    show_context: bool,
) -> Result<()> {
    let params = config.retrieval.checked_params(limit, threshold)?;
    let backend = Backend::open(config).await?;

    let outcome = retrieve_with_outcome(
        backend.store.as_ref(),
        backend.embedder.as_ref(),
        chatbot_id,
        query,
        &params,
    )
    .await;

    for failure in &outcome.failures {
        eprintln!("warning: {:?} failed: {}", failure.stage, failure.message);
    }

    if show_context {
        print!("{}", build_source_context(&outcome.sources));
        if !outcome.sources.is_empty() {
            println!();
        }
        return Ok(());
    }

    if outcome.tier == Tier::Empty {
        println!("No sources.");
        return Ok(());
    }

    println!(
        "tier: {}",
        match outcome.tier {
            Tier::Similarity => "similarity",
            Tier::Fallback => "fallback",
            Tier::Empty => "empty",
        }
    );
    for (i, s) in outcome.sources.iter().enumerate() {
        let score = s
            .similarity
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| "  -  ".to_string());
        println!(
            "{}. [{}] {}",
            i + 1,
            score,
            s.title.as_deref().unwrap_or("(untitled)")
        );
        let excerpt: String = s.content.chars().take(200).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
        println!("    id: {}", s.id);
    }
    Ok(())
}
