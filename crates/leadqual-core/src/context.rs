//! Prompt context building from retrieved sources.
//!
//! Turns the retriever's output into the knowledge-base section injected
//! into the conversational model's system prompt. Pure and deterministic:
//! the same sources in the same order always produce the same string.
//!
//! # Format
//!
//! ```text
//! ## Knowledge Base
//!
//! <preamble>
//!
//! [Pricing]
//! Plans start at ...
//!
//! ---
//!
//! [Source 2]
//! Untitled chunk content ...
//!
//! <postamble>
//! ```

use crate::models::Source;

/// Separator placed between rendered sources.
pub const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

const PREAMBLE: &str = "## Knowledge Base\n\n\
Use the following information from the knowledge base to answer the visitor's \
questions accurately. Prefer it over general knowledge when they disagree, and \
do not quote it verbatim unless asked.";

const POSTAMBLE: &str = "If the knowledge base above does not contain information \
relevant to the visitor's question, say so honestly instead of guessing, then \
continue the conversation.";

/// Render sources into a knowledge-base prompt section.
///
/// Returns an empty string for an empty slice, so chatbots without a
/// knowledge base get an unmodified prompt.
pub fn build_source_context(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let label = match &source.title {
                Some(title) => title.clone(),
                None => format!("Source {}", i + 1),
            };
            format!("[{}]\n{}", label, source.content)
        })
        .collect();

    format!(
        "{}\n\n{}\n\n{}",
        PREAMBLE,
        blocks.join(SOURCE_SEPARATOR),
        POSTAMBLE
    )
}

/// Append the knowledge-base section to a chatbot's base system prompt.
///
/// The base prompt is returned unchanged when there are no sources.
pub fn build_system_prompt(base_prompt: &str, sources: &[Source]) -> String {
    let context = build_source_context(sources);
    if context.is_empty() {
        base_prompt.to_string()
    } else if base_prompt.trim().is_empty() {
        context
    } else {
        format!("{}\n\n{}", base_prompt.trim_end(), context)
    }
}
