//! Opens the configured source store and embedding provider.

use anyhow::{bail, Result};
use std::sync::Arc;

use leadqual_core::embedding::EmbeddingProvider;
use leadqual_core::store::SourceStore;

use crate::config::Config;
use crate::db;
use crate::embedding::create_provider;
use crate::rest_store::RestStore;
use crate::sqlite_store::SqliteStore;

/// The store and embedder every command works against.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn SourceStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
}

impl Backend {
    pub fn new(store: Arc<dyn SourceStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Build the backend selected by `[store]` and `[embedding]`.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;
        let embedder = create_provider(&config.embedding)?;
        Ok(Self { store, embedder })
    }
}

/// Open the source store selected by `store.backend`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn SourceStore>> {
    match config.store.backend.as_str() {
        "sqlite" => {
            let pool = db::connect(config).await?;
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        "rest" => Ok(Arc::new(RestStore::from_config(&config.store)?)),
        other => bail!("Unknown store backend: {}", other),
    }
}
