//! TOML configuration parsing and validation.
//!
//! Leadqual reads a single TOML file (default `./config/lq.toml`). Every
//! section except `[db]` and `[server]` has defaults, so a minimal file is:
//!
//! ```toml
//! [db]
//! path = "./data/lq.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! See [`load_config`] for validation rules.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use leadqual_core::retrieve::{RetrievalParams, DEFAULT_LIMIT, DEFAULT_THRESHOLD};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Where sources are stored.
///
/// `sqlite` uses the local database at `[db].path`; `rest` talks to the
/// hosted database's PostgREST API.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}
fn default_api_key_env() -> String {
    "SUPABASE_SERVICE_ROLE_KEY".to_string()
}
fn default_store_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            threshold: default_threshold(),
        }
    }
}

/// Largest `limit` a single request may ask for.
pub const MAX_REQUEST_LIMIT: usize = 50;

impl RetrievalConfig {
    /// Retrieval parameters, with optional per-request overrides.
    pub fn params(&self, limit: Option<usize>, threshold: Option<f64>) -> RetrievalParams {
        RetrievalParams {
            limit: limit.unwrap_or(self.limit),
            threshold: threshold.unwrap_or(self.threshold),
        }
    }

    /// Like [`params`](Self::params), but rejects overrides outside
    /// `1..=MAX_REQUEST_LIMIT` and `[0.0, 1.0]` (including NaN).
    pub fn checked_params(
        &self,
        limit: Option<usize>,
        threshold: Option<f64>,
    ) -> Result<RetrievalParams> {
        if let Some(n) = limit {
            if n == 0 || n > MAX_REQUEST_LIMIT {
                bail!("limit must be between 1 and {}", MAX_REQUEST_LIMIT);
            }
        }
        if let Some(t) = threshold {
            if !(0.0..=1.0).contains(&t) {
                bail!("threshold must be in [0.0, 1.0]");
            }
        }
        Ok(self.params(limit, threshold))
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (OpenAI-compatible gateway or Ollama host).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    10
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse, and validate the configuration file at `path`.
///
/// # Validation
///
/// - `retrieval.limit >= 1` and `retrieval.threshold` in `[0.0, 1.0]`
/// - `chunking.max_tokens > 0`
/// - an enabled embedding provider needs `model` and `dims > 0`
/// - `embedding.provider` is `disabled`, `openai`, or `ollama`
/// - `store.backend` is `sqlite` or `rest`; `rest` needs `store.url`
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.limit < 1 {
        bail!("retrieval.limit must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.threshold) {
        bail!("retrieval.threshold must be in [0.0, 1.0]");
    }

    if config.chunking.max_tokens == 0 {
        bail!("chunking.max_tokens must be > 0");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    match config.store.backend.as_str() {
        "sqlite" => {}
        "rest" => {
            if config.store.url.is_none() {
                bail!("store.url must be set when store.backend is 'rest'");
            }
        }
        other => bail!(
            "Unknown store backend: '{}'. Must be sqlite or rest.",
            other
        ),
    }

    Ok(())
}
