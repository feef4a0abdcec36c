//! In-memory [`VectorIndex`] implementation for tests and embeddable hosts.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Queries are
//! brute-force cosine distance over all stored vectors; the sort is stable,
//! so equally distant entries keep insertion order.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::EngineError;

use super::{IndexEntry, IndexMatch, VectorIndex};

/// In-memory vector index.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), EngineError> {
        let mut stored = self.entries.write().unwrap();
        for entry in entries {
            stored.retain(|e| e.id != entry.id);
            stored.push(entry.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<IndexMatch>, EngineError> {
        let stored = self.entries.read().unwrap();
        let mut matches: Vec<IndexMatch> = stored
            .iter()
            .map(|e| IndexMatch {
                id: e.id.clone(),
                distance: 1.0 - cosine_similarity(embedding, &e.embedding),
                document: e.document.clone(),
                metadata: e.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(n_results);
        Ok(matches)
    }

    async fn count(&self) -> Result<usize, EngineError> {
        Ok(self.entries.read().unwrap().len())
    }
}
