//! PostgreSQL + pgvector guideline store.
//!
//! Implements [`GuidelineStore`] with similarity search fully delegated to
//! the database: one parameterized SELECT hands the embedding-model id and
//! the query text to the in-database embedding function, and rows come back
//! already ranked by dot-product similarity. No vector math happens in this
//! process, for search or for ingestion.
//!
//! # Setup
//!
//! ```sql
//! CREATE EXTENSION IF NOT EXISTS vector;
//! ```
//!
//! plus the pgai extension providing `ai.openai_embed`. `migrate()` creates
//! the schema and chunk table.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info, warn};

use labfollowup_config::GuidelinesConfig;
use labfollowup_core::error::StoreError;
use labfollowup_core::{GuidelineChunk, GuidelineStore};

/// Hard cap on rows a single search may return.
const MAX_SEARCH_LIMIT: usize = 50;

/// PostgreSQL-backed guideline chunk store.
pub struct SqlGuidelineStore {
    pool: PgPool,
    config: GuidelinesConfig,
    /// Dimension of the embedding column (default 1536).
    embedding_dim: usize,
}

impl SqlGuidelineStore {
    /// Connect to the vector-enabled database.
    pub async fn connect(config: &GuidelinesConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        info!("Connected to PostgreSQL guideline store");
        Ok(Self::from_pool(pool, config))
    }

    /// Create from an existing connection pool.
    pub fn from_pool(pool: PgPool, config: &GuidelinesConfig) -> Self {
        Self {
            pool,
            config: config.clone(),
            embedding_dim: 1536,
        }
    }

    /// Set the embedding dimension (default: 1536).
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Create the schema, chunk table, and index if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let table = self.config.qualified_table();

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("vector extension: {e}")))?;

        sqlx::query(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            self.config.schema
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("schema: {e}")))?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                chunk_id      TEXT PRIMARY KEY,
                guideline_id  TEXT NOT NULL,
                chunk_text    TEXT NOT NULL,
                embedding     vector({dim}),
                created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            dim = self.embedding_dim
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("chunk table: {e}")))?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_guideline_id ON {table}(guideline_id)",
            self.config.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("guideline_id index: {e}")))?;

        info!("Guideline store migration complete");
        Ok(())
    }

    /// Upsert one document's chunks under ids `{guideline_id}:chunk-{index}`.
    ///
    /// A chunk whose text changed gets its embedding cleared so the next
    /// [`Self::embed_missing`] pass recomputes it; unchanged chunks keep
    /// theirs.
    pub async fn upsert_chunks(
        &self,
        guideline_id: &str,
        chunks: &[String],
    ) -> Result<u64, StoreError> {
        let sql = Self::upsert_sql(&self.config.qualified_table());
        let mut count = 0u64;

        for (idx, chunk_text) in chunks.iter().enumerate() {
            let chunk_id = format!("{guideline_id}:chunk-{idx}");
            sqlx::query(&sql)
                .bind(&chunk_id)
                .bind(guideline_id)
                .bind(chunk_text)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    StoreError::QueryFailed(format!("Failed to upsert chunk {chunk_id}: {e}"))
                })?;
            count += 1;
        }

        debug!(guideline_id, chunks = count, "Upserted guideline chunks");
        Ok(count)
    }

    /// Compute embeddings in-database for every chunk that has none.
    ///
    /// Returns the number of rows updated.
    pub async fn embed_missing(&self) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE {} SET embedding = ai.openai_embed($1, chunk_text) \
             WHERE embedding IS NULL",
            self.config.qualified_table()
        );

        let result = sqlx::query(&sql)
            .bind(&self.config.embedding_model)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Embedding rebuild failed: {e}")))?;

        info!(
            rows = result.rows_affected(),
            model = %self.config.embedding_model,
            "Computed embeddings for chunks without one"
        );
        Ok(result.rows_affected())
    }

    /// Total chunk rows and how many of them carry an embedding.
    pub async fn chunk_counts(&self) -> Result<(i64, i64), StoreError> {
        let sql = format!(
            "SELECT COUNT(*) AS total, COUNT(embedding) AS embedded FROM {}",
            self.config.qualified_table()
        );

        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Failed to count chunks: {e}")))?;

        Ok((row.get("total"), row.get("embedded")))
    }

    /// The ranked-similarity SELECT. `$1` = embedding model, `$2` = query
    /// text, `$3` = row limit; the database embeds the query itself.
    fn search_sql(table: &str) -> String {
        format!(
            "SELECT chunk_id, guideline_id, chunk_text, \
             -(embedding <#> ai.openai_embed($1, $2)) AS similarity \
             FROM {table} \
             WHERE embedding IS NOT NULL \
             ORDER BY embedding <#> ai.openai_embed($1, $2) ASC \
             LIMIT $3"
        )
    }

    fn upsert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {table} AS gc (chunk_id, guideline_id, chunk_text) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (chunk_id) DO UPDATE SET \
               chunk_text = EXCLUDED.chunk_text, \
               embedding = CASE \
                 WHEN gc.chunk_text IS DISTINCT FROM EXCLUDED.chunk_text THEN NULL \
                 ELSE gc.embedding \
               END, \
               created_at = NOW()"
        )
    }
}

/// Convert a database row into a GuidelineChunk.
fn row_to_chunk(row: &PgRow) -> GuidelineChunk {
    GuidelineChunk {
        chunk_id: row.get("chunk_id"),
        guideline_id: row.get("guideline_id"),
        chunk_text: row.get("chunk_text"),
        similarity: row.get("similarity"),
    }
}

#[async_trait]
impl GuidelineStore for SqlGuidelineStore {
    /// Similarity search, ranking delegated to the database.
    ///
    /// Transport and SQL failures are logged and collapse to an empty result
    /// list so the pipeline proceeds with degraded evidence rather than
    /// aborting the case.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<Vec<GuidelineChunk>, StoreError> {
        let limit = top_k.clamp(1, MAX_SEARCH_LIMIT);
        let sql = Self::search_sql(&self.config.qualified_table());

        debug!(top_k = limit, "Guideline similarity search");

        let rows = match sqlx::query(&sql)
            .bind(&self.config.embedding_model)
            .bind(query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Guideline search failed, returning no results");
                return Ok(Vec::new());
            }
        };

        Ok(rows.iter().map(row_to_chunk).collect())
    }
}
