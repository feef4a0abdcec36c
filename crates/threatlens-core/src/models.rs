//! Core data models flowing through the ingestion and retrieval pipelines.
//!
//! Every response-side type derives [`Serialize`] so the two pipeline entry
//! points return plain JSON-serializable data — numbers, strings, lists, and
//! string-keyed maps only; no opaque objects cross the boundary.

use serde::{Deserialize, Serialize};

/// A contiguous segment of a source document, produced during ingestion.
///
/// Chunks are immutable once created and persist only as entries in the
/// vector index. The id is always `"{doc_id}:{chunk_index}"`.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub chunk_index: usize,
    pub text: String,
}

/// Per-chunk record attached to an index entry at upsert time.
///
/// The tag, tactic, and indicator fields are derived deterministically from
/// the chunk text — re-ingesting identical text yields an identical record.
/// All collection fields default to empty on deserialization, so an entry
/// written without them reads back as "no tags" rather than a missing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub doc_id: String,
    /// Same as `doc_id`; kept as a separate field for index-side filtering.
    pub source: String,
    pub chunk_index: usize,
    /// SHA-256 hex digest of the chunk text, used for change detection.
    pub hash: String,
    #[serde(default)]
    pub threat_tags: Vec<String>,
    #[serde(default)]
    pub mitre_tactics: Vec<String>,
    /// Sorted, de-duplicated indicator strings (CVE ids, technique codes).
    #[serde(default)]
    pub intel_indicators: Vec<String>,
    /// Redacted prefix of the chunk text, at most 280 characters.
    #[serde(default)]
    pub sanitized_preview: String,
}

/// Threat-intent profile extracted from any text — document, chunk, or query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatIntelProfile {
    /// Matched threat categories, in pattern-table declaration order.
    pub tags: Vec<String>,
    /// Matched attacker tactics, in pattern-table declaration order.
    pub tactics: Vec<String>,
    /// Literal indicators (CVE ids, technique codes), sorted and de-duplicated.
    pub indicators: Vec<String>,
}

impl ThreatIntelProfile {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.tactics.is_empty() && self.indicators.is_empty()
    }
}

/// Configuration for a single retrieval call. Constructed fresh per query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of hits to return. Must be at least 1.
    pub top_k: usize,
    /// `"vector"`, `"hybrid"`, or `"intel"`.
    pub retrieval_mode: String,
    pub semantic_weight: f64,
    pub keyword_weight: f64,
    pub threat_weight: f64,
    /// Allow-list of document ids. Empty means no filter.
    pub doc_ids: Vec<String>,
    /// Tags every returned hit must carry. Empty means no filter.
    pub required_threat_tags: Vec<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            retrieval_mode: "vector".to_string(),
            semantic_weight: 0.7,
            keyword_weight: 0.2,
            threat_weight: 0.1,
            doc_ids: Vec::new(),
            required_threat_tags: Vec::new(),
        }
    }
}

/// One ranked retrieval result.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    /// Chunk id (`"{doc_id}:{chunk_index}"`).
    pub id: String,
    /// Raw distance in the index's native units (ascending = closer).
    pub distance: f32,
    /// Composite relevance score.
    pub score: f64,
    /// Semantic component (populated in hybrid/intel mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f64>,
    /// Keyword-overlap component (populated in hybrid/intel mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_score: Option<f64>,
    /// Threat-tag-coverage component (populated in hybrid/intel mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_score: Option<f64>,
    pub metadata: ChunkMetadata,
    /// Redacted excerpt of the stored chunk text, at most 400 characters.
    pub preview: String,
}

/// Response payload of a retrieval call.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub query: String,
    pub retrieval_mode: String,
    /// Profile extracted from the query text itself.
    pub threat_profile: ThreatIntelProfile,
    pub hits: Vec<Hit>,
}

/// Per-document summary returned by the ingestion pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub doc_id: String,
    /// Number of chunks written to the index.
    pub chunks: usize,
    /// SHA-256 hex digest of the full decoded document text.
    pub hash: String,
    pub chunk_mode: String,
    /// Document-level profile, extracted from the full text in one pass
    /// (not a union of chunk profiles).
    pub threat_tags: Vec<String>,
    pub mitre_tactics: Vec<String>,
    pub intel_indicators: Vec<String>,
}
