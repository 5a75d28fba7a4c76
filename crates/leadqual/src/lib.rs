//! # Leadqual
//!
//! **Knowledge-base retrieval and BANT lead qualification for chat widgets.**
//!
//! A sales chat widget asks this service two things on every turn: which
//! of the chatbot's knowledge sources are relevant to the visitor's latest
//! message, and how far the assistant has progressed through its
//! qualification questions (name, email, need, timeline, budget/authority).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │   Ingest     │──▶│  Embedding   │──▶│  SourceStore    │
//! │ chunk+embed  │   │  provider    │   │ SQLite / REST   │
//! └──────────────┘   └──────────────┘   └────────┬────────┘
//!                                                │
//!                    ┌───────────────────────────┤
//!                    ▼                           ▼
//!               ┌──────────┐               ┌──────────┐
//!               │   CLI    │               │   HTTP   │
//!               │   (lq)   │               │  server  │
//!               └──────────┘               └──────────┘
//! ```
//!
//! The retrieval pipeline, BANT heuristic, and prompt rendering live in
//! [`leadqual_core`] (re-exported as [`core`]); this crate wires them to
//! real storage, embedding APIs, configuration, and the outer surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] / [`migrate`] | SQLite pool and schema |
//! | [`sqlite_store`] | Local `SourceStore` with brute-force cosine search |
//! | [`rest_store`] | `SourceStore` over a hosted PostgREST API |
//! | [`embedding`] | OpenAI / Ollama / disabled providers |
//! | [`backend`] | Opens the configured store and provider |
//! | [`ingest`] | Chunk, embed, and store source text |
//! | [`server`] | JSON HTTP API |
//! | [`sources`] / [`retrieve`] / [`bant`] | CLI command implementations |

pub mod backend;
pub mod bant;
pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod rest_store;
pub mod retrieve;
pub mod server;
pub mod sources;
pub mod sqlite_store;

pub use leadqual_core as core;
