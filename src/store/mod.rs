#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::metadata::GuideMetadata;

/// Merged metadata of one ingested document, copied onto every chunk so
/// each chunk is independently retrievable with full context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// The URL that actually resolved during fetch.
    pub url: String,
    /// Product version the corpus was built for.
    pub version: String,
    /// Guide title derived from the URL.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl DocumentMetadata {
    /// Fetch-derived fields only; header attributes are merged on top.
    #[inline]
    pub fn new(url: String, version: String, title: String) -> Self {
        Self {
            url,
            version,
            title,
            topics: None,
            categories: None,
            extensions: None,
            summary: None,
        }
    }

    /// Merge header attributes. On key collision the header wins: those
    /// values are author intent, not derived data. Absent attributes leave
    /// existing values untouched.
    #[inline]
    pub fn apply_header(&mut self, header: &GuideMetadata) {
        if let Some(topics) = &header.topics {
            self.topics = Some(topics.clone());
        }
        if let Some(categories) = &header.categories {
            self.categories = Some(categories.clone());
        }
        if let Some(extensions) = &header.extensions {
            self.extensions = Some(extensions.clone());
        }
        if let Some(summary) = &header.summary {
            self.summary = Some(summary.clone());
        }
    }
}

/// One chunk ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub text: String,
    pub sequence_index: usize,
    pub embedding: Vec<f32>,
    pub metadata: DocumentMetadata,
}

/// One logical write to the store: a document and all of its chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Stable key (the discovered guide URL); upserts overwrite by this.
    pub identifier: String,
    pub metadata: DocumentMetadata,
    pub chunks: Vec<EmbeddedChunk>,
}

/// Persists documents; the vector store behind it is an external
/// collaborator.
///
/// Implementations must overwrite by key, not append: idempotence across
/// runs depends on it.
#[async_trait]
pub trait DocumentSink {
    async fn upsert(&self, document: &DocumentRecord) -> Result<()>;
}

/// pgvector-backed document sink.
#[derive(Debug, Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    table: String,
    dimension: u32,
}

impl PgVectorStore {
    /// Connect and ensure the extension, table and index exist.
    #[inline]
    pub async fn connect(config: &PostgresConfig, dimension: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&config.connection_url())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to postgres at {}:{}",
                    config.host, config.port
                )
            })?;

        let store = Self {
            pool,
            table: config.table.clone(),
            dimension,
        };
        store.init_schema().await?;

        info!(
            "Connected to pgvector store ({}, dimension {})",
            store.table, store.dimension
        );
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .context("Failed to create vector extension")?;

        // Table name comes from validated configuration, not user content.
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                embedding_id UUID PRIMARY KEY,
                url TEXT NOT NULL,
                chunk_index BIGINT NOT NULL,
                text TEXT NOT NULL,
                metadata JSONB NOT NULL,
                embedding VECTOR({}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            self.table, self.dimension
        );
        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .context("Failed to create store table")?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {}_url_idx ON {} (url)",
            self.table, self.table
        );
        sqlx::query(&create_index)
            .execute(&self.pool)
            .await
            .context("Failed to create url index")?;

        Ok(())
    }
}

#[async_trait]
impl DocumentSink for PgVectorStore {
    async fn upsert(&self, document: &DocumentRecord) -> Result<()> {
        debug!(
            "Upserting {} ({} chunks)",
            document.identifier,
            document.chunks.len()
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // Overwrite-by-key: replace all chunks of this document in one
        // transaction.
        sqlx::query(&format!("DELETE FROM {} WHERE url = $1", self.table))
            .bind(&document.identifier)
            .execute(&mut *tx)
            .await
            .context("Failed to delete existing chunks")?;

        let insert = format!(
            "INSERT INTO {} (embedding_id, url, chunk_index, text, metadata, embedding, created_at)
             VALUES ($1, $2, $3, $4, $5, $6::vector, $7)",
            self.table
        );
        let created_at = Utc::now();

        for chunk in &document.chunks {
            let chunk_index = i64::try_from(chunk.sequence_index)
                .context("Chunk index does not fit in BIGINT")?;
            let metadata = serde_json::to_value(&chunk.metadata)
                .context("Failed to serialize chunk metadata")?;

            sqlx::query(&insert)
                .bind(Uuid::new_v4())
                .bind(&document.identifier)
                .bind(chunk_index)
                .bind(&chunk.text)
                .bind(metadata)
                .bind(vector_literal(&chunk.embedding))
                .bind(created_at)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!(
                        "Failed to insert chunk {} of {}",
                        chunk.sequence_index, document.identifier
                    )
                })?;
        }

        tx.commit().await.context("Failed to commit upsert")?;
        Ok(())
    }
}

/// Render an embedding in pgvector's text input format.
fn vector_literal(embedding: &[f32]) -> String {
    let mut literal = String::with_capacity(embedding.len() * 10 + 2);
    literal.push('[');
    for (i, value) in embedding.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&value.to_string());
    }
    literal.push(']');
    literal
}
