//! SQLite-backed [`SourceStore`] implementation.
//!
//! Embeddings are stored as little-endian `f32` BLOBs. SQLite has no
//! vector index, so similarity search loads the chatbot's vectors and
//! scores them with brute-force cosine similarity; knowledge bases are
//! per chatbot and small enough for this to stay cheap.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use leadqual_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use leadqual_core::models::{NewSource, Source};
use leadqual_core::store::SourceStore;

/// SQLite implementation of the [`SourceStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SourceStore for SqliteStore {
    async fn match_sources(
        &self,
        chatbot_id: &str,
        query_vec: &[f32],
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<Source>> {
        let rows = sqlx::query(
            "SELECT id, title, content, embedding FROM sources WHERE chatbot_id = ?",
        )
        .bind(chatbot_id)
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<Source> = Vec::new();
        for row in rows {
            let blob: Vec<u8> = row.get("embedding");
            let vec = blob_to_vec(&blob);
            let sim = cosine_similarity(query_vec, &vec) as f64;
            if sim < threshold {
                continue;
            }
            scored.push(Source {
                id: row.get("id"),
                title: row.get("title"),
                content: row.get("content"),
                similarity: Some(sim),
            });
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn list_sources(&self, chatbot_id: &str, limit: usize) -> Result<Vec<Source>> {
        let rows = sqlx::query("SELECT id, title, content FROM sources WHERE chatbot_id = ? LIMIT ?")
            .bind(chatbot_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Source {
                id: row.get("id"),
                title: row.get("title"),
                content: row.get("content"),
                similarity: None,
            })
            .collect())
    }

    async fn insert_source(&self, source: &NewSource) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO sources (id, chatbot_id, title, content, embedding, dims, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&source.chatbot_id)
        .bind(&source.title)
        .bind(&source.content)
        .bind(vec_to_blob(&source.embedding))
        .bind(source.embedding.len() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn delete_source(&self, chatbot_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE chatbot_id = ? AND id = ?")
            .bind(chatbot_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_chatbot_sources(&self, chatbot_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sources WHERE chatbot_id = ?")
            .bind(chatbot_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_sources(&self, chatbot_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources WHERE chatbot_id = ?")
            .bind(chatbot_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
