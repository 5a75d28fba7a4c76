//! `lq bant`: score a saved conversation transcript.
//!
//! The transcript is a JSON array of `{ "role": "...", "content": "..." }`
//! objects, or an object with a `messages` array of the same shape (the
//! body accepted by `POST /bant/progress`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use leadqual_core::bant::{bant_report, BantProgress};
use leadqual_core::models::ChatMessage;

#[derive(Deserialize)]
#[serde(untagged)]
enum Transcript {
    Bare(Vec<ChatMessage>),
    Wrapped { messages: Vec<ChatMessage> },
}

/// Parse a transcript in either accepted shape.
pub fn parse_transcript(json: &str) -> Result<Vec<ChatMessage>> {
    let transcript: Transcript = serde_json::from_str(json).context("invalid transcript JSON")?;
    Ok(match transcript {
        Transcript::Bare(messages) => messages,
        Transcript::Wrapped { messages } => messages,
    })
}

/// Score the transcript stored at `path`.
pub fn score_file(path: &Path) -> Result<BantProgress> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    Ok(bant_report(&parse_transcript(&json)?))
}

/// CLI entry point for `lq bant`.
pub fn run_bant(path: &Path, as_json: bool) -> Result<()> {
    let report = score_file(path)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("progress: {}%", report.progress);
    for step in leadqual_core::bant::BantStep::ALL {
        let mark = if report.asked.contains(&step) { "x" } else { " " };
        println!("  [{}] {}", mark, step.label());
    }
    Ok(())
}
