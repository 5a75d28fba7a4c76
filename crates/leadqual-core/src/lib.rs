//! # Leadqual Core
//!
//! Runtime-agnostic logic for Leadqual: data models, BANT qualification
//! scoring, chunking, the source store abstraction, the embedding trait,
//! RAG retrieval with graceful degradation, and prompt context building.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.
//! Concrete stores and embedding providers live in the `leadqual` app
//! crate and plug in through [`store::SourceStore`] and
//! [`embedding::EmbeddingProvider`].

pub mod bant;
pub mod chunk;
pub mod context;
pub mod embedding;
pub mod models;
pub mod retrieve;
pub mod store;
