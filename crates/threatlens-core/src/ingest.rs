//! Document ingestion pipeline.
//!
//! Coordinates the full flow for one document: decode → chunk → per-chunk
//! threat profiling → batch embedding → index upsert. Ingestion of a
//! document is atomic with respect to the index: the single embedding call
//! happens before the upsert, so an embedding failure writes nothing.
//!
//! Batch ingestion of many documents is a plain iteration over
//! [`ingest_document`] in the calling application; one document's failure
//! must not abort the rest.

use sha2::{Digest, Sha256};

use crate::chunk::{chunk_text, ChunkMode};
use crate::embedding::EmbeddingProvider;
use crate::error::EngineError;
use crate::index::{IndexEntry, VectorIndex};
use crate::models::{ChunkMetadata, IngestSummary};
use crate::sanitize::sanitized_preview;
use crate::threat::extract_profile;

/// Maximum characters of chunk text kept in the stored sanitized preview.
const METADATA_PREVIEW_CHARS: usize = 280;

/// Chunking parameters for one ingestion call.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Window overlap in characters.
    pub overlap: usize,
    pub mode: ChunkMode,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 150,
            mode: ChunkMode::Fixed,
        }
    }
}

/// Ingest one document into the vector index.
///
/// Steps, in order: best-effort decode of `raw` (invalid UTF-8 sequences are
/// dropped, never fatal), chunking per `options`, per-chunk metadata with a
/// threat profile and content hash, one batched embedding call, and a single
/// upsert of all chunk entries. The document-level profile in the returned
/// summary comes from an independent extraction over the full decoded text,
/// not a union of the chunk profiles — a pattern split across a chunk
/// boundary still counts at document level.
///
/// # Errors
///
/// - [`EngineError::InvalidArgument`] for an empty `doc_id` or a zero
///   `chunk_size`, before any side effect.
/// - [`EngineError::ProviderUnavailable`] when the embedding backend is not
///   ready; nothing has been upserted.
pub async fn ingest_document(
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    doc_id: &str,
    raw: &[u8],
    options: &IngestOptions,
) -> Result<IngestSummary, EngineError> {
    if doc_id.trim().is_empty() {
        return Err(EngineError::invalid("Document id cannot be empty"));
    }
    if options.chunk_size == 0 {
        return Err(EngineError::invalid("chunk_size must be at least 1"));
    }

    let text = decode_lossy(raw);
    let doc_profile = extract_profile(&text);
    let doc_hash = hash_text(&text);

    let pieces = chunk_text(&text, options.chunk_size, options.overlap, options.mode);

    let summary = IngestSummary {
        doc_id: doc_id.to_string(),
        chunks: pieces.len(),
        hash: doc_hash,
        chunk_mode: options.mode.as_str().to_string(),
        threat_tags: doc_profile.tags,
        mitre_tactics: doc_profile.tactics,
        intel_indicators: doc_profile.indicators,
    };

    if pieces.is_empty() {
        return Ok(summary);
    }

    let mut entries = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        let profile = extract_profile(piece);
        entries.push(IndexEntry {
            id: format!("{}:{}", doc_id, i),
            embedding: Vec::new(),
            document: piece.clone(),
            metadata: ChunkMetadata {
                doc_id: doc_id.to_string(),
                source: doc_id.to_string(),
                chunk_index: i,
                hash: hash_text(piece),
                threat_tags: profile.tags,
                mitre_tactics: profile.tactics,
                intel_indicators: profile.indicators,
                sanitized_preview: sanitized_preview(piece, METADATA_PREVIEW_CHARS),
            },
        });
    }

    // One batch call; on failure nothing has been written yet.
    let embeddings = embedder.embed(&pieces).await?;
    if embeddings.len() != entries.len() {
        return Err(EngineError::Backend(anyhow::anyhow!(
            "Embedding provider returned {} vectors for {} chunks",
            embeddings.len(),
            entries.len()
        )));
    }
    for (entry, embedding) in entries.iter_mut().zip(embeddings) {
        entry.embedding = embedding;
    }

    index.upsert(&entries).await?;

    Ok(summary)
}

/// Decode bytes as UTF-8, dropping invalid sequences rather than failing.
///
/// A fully valid input is passed through untouched, including any literal
/// replacement characters it may contain.
pub fn decode_lossy(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(raw)
            .chars()
            .filter(|c| *c != char::REPLACEMENT_CHARACTER)
            .collect(),
    }
}

/// SHA-256 hex digest of a text.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8_passthrough() {
        assert_eq!(decode_lossy("threat report".as_bytes()), "threat report");
    }

    #[test]
    fn test_decode_drops_invalid_sequences() {
        let raw = b"intel\xff\xfe feed";
        assert_eq!(decode_lossy(raw), "intel feed");
    }

    #[test]
    fn test_hash_is_stable() {
        let a = hash_text("same input");
        let b = hash_text("same input");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_text("other input"));
    }
}
