//! Paragraph-boundary chunker for knowledge-base ingestion.
//!
//! Uploaded documents are split into chunks small enough to embed and to
//! inject into a prompt. Each chunk becomes one stored source.
//!
//! # Algorithm
//!
//! 1. Convert `max_tokens` to `max_chars` using a 4 chars/token ratio.
//! 2. Split text on `\n\n` paragraph boundaries, dropping blank paragraphs.
//! 3. Accumulate paragraphs until the next one would exceed `max_chars`,
//!    then flush.
//! 4. Paragraphs longer than `max_chars` are hard-split at the last
//!    newline or space before the limit (or at the limit itself, snapped
//!    to a UTF-8 char boundary).
//!
//! # Example
//!
//! ```rust
//! use leadqual_core::chunk::split_into_chunks;
//!
//! let chunks = split_into_chunks("Hello world.\n\nSecond paragraph.", 500);
//! assert_eq!(chunks, vec!["Hello world.\n\nSecond paragraph."]);
//! ```

/// Approximate characters-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// Split text into chunks on paragraph boundaries, respecting `max_tokens`.
///
/// Returns no chunks for blank input. Chunks are trimmed and never empty.
pub fn split_into_chunks(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);
    let mut chunks = Vec::new();
    let mut buf = String::new();

    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let would_be = if buf.is_empty() {
            para.len()
        } else {
            buf.len() + 2 + para.len()
        };

        if would_be > max_chars && !buf.is_empty() {
            chunks.push(std::mem::take(&mut buf));
        }

        if para.len() > max_chars {
            hard_split(para, max_chars, &mut chunks);
            continue;
        }

        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(para);
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }

    chunks
}

fn hard_split(para: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = para;
    while !remaining.is_empty() {
        if remaining.len() <= max_chars {
            push_trimmed(remaining, out);
            break;
        }
        let limit = snap_to_char_boundary(remaining, max_chars);
        let split_at = remaining[..limit]
            .rfind(['\n', ' '])
            .map(|pos| pos + 1)
            .unwrap_or(limit);
        // A single char wider than max_chars still has to make progress.
        let split_at = if split_at == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            split_at
        };
        push_trimmed(&remaining[..split_at], out);
        remaining = &remaining[split_at..];
    }
}

fn push_trimmed(piece: &str, out: &mut Vec<String>) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
