//! Core data types shared by the retrieval pipeline and the BANT estimator.

use serde::{Deserialize, Serialize};

/// One retrievable knowledge chunk belonging to a chatbot.
///
/// This is the query-result shape: the stored embedding is never carried
/// back to callers, and `similarity` is only populated by similarity
/// search (fallback listings leave it `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Opaque identifier, unique per chatbot.
    pub id: String,
    /// Optional display label.
    #[serde(default)]
    pub title: Option<String>,
    /// Raw text body.
    pub content: String,
    /// Query-time similarity in `[0.0, 1.0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// A source as created at ingestion time, before the store assigns an id.
///
/// The embedding is computed once here and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct NewSource {
    pub chatbot_id: String,
    pub title: Option<String>,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any other role (`system`, `tool`, ...). Ignored by the estimator.
    #[serde(other)]
    Other,
}

/// Anything in a transcript that knows who wrote it.
///
/// The BANT estimator is generic over this so callers can score their own
/// message representations without converting them first.
pub trait HasRole {
    fn role(&self) -> Role;
}

/// A plain transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl HasRole for ChatMessage {
    fn role(&self) -> Role {
        self.role
    }
}
