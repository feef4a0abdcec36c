//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the narrow contract the engine holds against
//! its system of record. The ingestion pipeline is the only writer; the
//! retrieval engine only reads. Implementations must be `Send + Sync` to
//! work with async runtimes.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert`](VectorIndex::upsert) | Write entries, keyed by chunk id |
//! | [`query`](VectorIndex::query) | Nearest neighbors, ascending distance |
//! | [`count`](VectorIndex::count) | Number of stored entries |

pub mod memory;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::models::ChunkMetadata;

/// One entry written to the index at ingest time.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Chunk id (`"{doc_id}:{chunk_index}"`).
    pub id: String,
    pub embedding: Vec<f32>,
    /// The chunk text itself.
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// One nearest-neighbor match returned from a query.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: String,
    /// Distance in the index's native units; smaller is closer.
    pub distance: f32,
    pub document: String,
    pub metadata: ChunkMetadata,
}

/// Abstract vector store: embeddings plus typed metadata plus documents,
/// keyed by chunk id.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries by id.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), EngineError>;

    /// Return up to `n_results` nearest neighbors of `embedding`, ordered by
    /// ascending distance, with metadata and source documents included.
    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, EngineError>;

    /// Number of entries currently stored.
    async fn count(&self) -> Result<usize, EngineError>;
}
