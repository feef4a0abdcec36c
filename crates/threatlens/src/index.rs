//! SQLite-backed [`VectorIndex`] implementation.
//!
//! Entries live in a single `entries` table keyed by `(collection, id)`,
//! with the embedding stored as a little-endian f32 BLOB via the core
//! codec. Queries are brute-force cosine distance over the collection,
//! ordered ascending. An upsert writes all of its entries in one
//! transaction, so a document's chunks land entirely or not at all.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use threatlens_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use threatlens_core::error::EngineError;
use threatlens_core::index::{IndexEntry, IndexMatch, VectorIndex};
use threatlens_core::models::ChunkMetadata;

/// Persistent vector index over a named collection in a SQLite file.
pub struct SqliteIndex {
    pool: SqlitePool,
    collection: String,
}

impl SqliteIndex {
    /// Open (or create) the database at `path` and get-or-create the named
    /// collection.
    pub async fn open(path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create index directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open index database: {}", path.display()))?;

        migrate(&pool).await?;

        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT OR IGNORE INTO collections (name, created_at) VALUES (?, ?)")
            .bind(collection)
            .bind(now)
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of distinct documents in the collection.
    pub async fn doc_count(&self) -> Result<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT doc_id) FROM entries WHERE collection = ?")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as usize)
    }

    async fn upsert_inner(&self, entries: &[IndexEntry]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let metadata_json = serde_json::to_string(&entry.metadata)?;
            let blob = vec_to_blob(&entry.embedding);

            sqlx::query(
                r#"
                INSERT INTO entries (collection, id, doc_id, document, metadata_json, embedding, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    doc_id = excluded.doc_id,
                    document = excluded.document,
                    metadata_json = excluded.metadata_json,
                    embedding = excluded.embedding,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&self.collection)
            .bind(&entry.id)
            .bind(&entry.metadata.doc_id)
            .bind(&entry.document)
            .bind(&metadata_json)
            .bind(&blob)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query_inner(&self, embedding: &[f32], n_results: usize) -> Result<Vec<IndexMatch>> {
        let rows = sqlx::query(
            "SELECT id, document, metadata_json, embedding FROM entries WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut matches = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let stored = blob_to_vec(&blob);
            let metadata_json: String = row.get("metadata_json");
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("Corrupt metadata for entry {}", row.get::<String, _>("id")))?;

            matches.push(IndexMatch {
                id: row.get("id"),
                distance: 1.0 - cosine_similarity(embedding, &stored),
                document: row.get("document"),
                metadata,
            });
        }

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(n_results);
        Ok(matches)
    }

    async fn count_inner(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), EngineError> {
        self.upsert_inner(entries).await.map_err(EngineError::from)
    }

    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, EngineError> {
        self.query_inner(embedding, n_results)
            .await
            .map_err(EngineError::from)
    }

    async fn count(&self) -> Result<usize, EngineError> {
        self.count_inner().await.map_err(EngineError::from)
    }
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            document TEXT NOT NULL,
            metadata_json TEXT NOT NULL,
            embedding BLOB NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_doc ON entries (collection, doc_id)")
        .execute(pool)
        .await?;

    Ok(())
}
