//! Retrieval engine with vector, hybrid, and intel modes.
//!
//! A stateless request/response pipeline: embed the query, over-fetch
//! candidates from the index, filter, score, sort, truncate. The query's own
//! threat profile is always extracted and returned alongside the hits.
//!
//! # Hybrid scoring
//!
//! For every candidate surviving the filters, three components are computed:
//!
//! 1. semantic — `1 / (1 + max(distance, 0))`, monotonically decreasing in
//!    distance and bounded in `(0, 1]`;
//! 2. keyword — share of the query's token set found among the candidate's
//!    tokens;
//! 3. threat — share of the query profile's tags carried by the candidate.
//!
//! The composite is the weighted sum under `QueryOptions` weights. The sort
//! is stable, so candidates with equal composites keep their index order.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::embedding::EmbeddingProvider;
use crate::error::EngineError;
use crate::index::{IndexMatch, VectorIndex};
use crate::models::{Hit, QueryOptions, RetrievalResult, ThreatIntelProfile};
use crate::sanitize::sanitized_preview;
use crate::threat::extract_profile;

/// Over-fetch multiplier applied to `top_k` when querying the index, to
/// leave room for post-filtering.
const CANDIDATE_FACTOR: usize = 3;

/// Maximum characters of chunk text kept in a hit preview.
const HIT_PREVIEW_CHARS: usize = 400;

/// Lowercase alphanumeric/hyphen/underscore runs.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9_-]+").unwrap());

/// Tokens excluded from keyword scoring.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "has", "have",
    "had", "but", "not", "all", "any", "can", "could", "will", "would", "into", "over", "about",
    "when", "where", "which", "what", "who", "how", "than", "then", "them", "they", "their",
    "there", "here", "our", "your", "its", "out", "via", "per", "each", "been", "being", "also",
    "such", "may", "might", "must", "should",
];

/// Supported retrieval modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Pure semantic ranking in index order.
    Vector,
    /// Weighted fusion of semantic, keyword, and threat signals.
    Hybrid,
    /// Same fusion formula as hybrid; callers pair it with threat-heavy
    /// weights.
    Intel,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Vector => "vector",
            RetrievalMode::Hybrid => "hybrid",
            RetrievalMode::Intel => "intel",
        }
    }
}

impl FromStr for RetrievalMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vector" => Ok(RetrievalMode::Vector),
            "hybrid" => Ok(RetrievalMode::Hybrid),
            "intel" => Ok(RetrievalMode::Intel),
            other => Err(EngineError::invalid(format!(
                "Unsupported retrieval mode: '{}'. Use vector, hybrid, or intel.",
                other
            ))),
        }
    }
}

/// Run a retrieval query against the index.
///
/// Arguments are validated before any side effect; an unsupported mode or a
/// zero `top_k` is rejected with [`EngineError::InvalidArgument`] and no
/// partial result. An empty index (or filters rejecting every candidate) is
/// not an error — the hit list is simply empty.
pub async fn retrieve(
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    query_text: &str,
    options: &QueryOptions,
) -> Result<RetrievalResult, EngineError> {
    let mode = RetrievalMode::from_str(&options.retrieval_mode)?;
    if options.top_k == 0 {
        return Err(EngineError::invalid("top_k must be at least 1"));
    }

    let query_profile = extract_profile(query_text);

    let query_embedding = embedder
        .embed(&[query_text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::Backend(anyhow::anyhow!("Empty embedding response")))?;

    let fetch_n = (options.top_k * CANDIDATE_FACTOR).max(options.top_k);
    let candidates = index.query(&query_embedding, fetch_n).await?;

    let survivors: Vec<IndexMatch> = candidates
        .into_iter()
        .filter(|c| passes_filters(c, options))
        .collect();

    let hits = match mode {
        RetrievalMode::Vector => rank_vector(survivors, options.top_k),
        RetrievalMode::Hybrid | RetrievalMode::Intel => {
            rank_hybrid(survivors, query_text, &query_profile, options)
        }
    };

    Ok(RetrievalResult {
        query: query_text.to_string(),
        retrieval_mode: mode.as_str().to_string(),
        threat_profile: query_profile,
        hits,
    })
}

/// Apply the doc-id allow-list and required-tag superset filters.
fn passes_filters(candidate: &IndexMatch, options: &QueryOptions) -> bool {
    if !options.doc_ids.is_empty() && !options.doc_ids.contains(&candidate.metadata.doc_id) {
        return false;
    }
    if !options.required_threat_tags.is_empty() {
        let tags = &candidate.metadata.threat_tags;
        if !options.required_threat_tags.iter().all(|t| tags.contains(t)) {
            return false;
        }
    }
    true
}

/// Pure semantic ranking: candidates stay in index order (ascending
/// distance), truncated once `top_k` survivors are collected.
fn rank_vector(survivors: Vec<IndexMatch>, top_k: usize) -> Vec<Hit> {
    survivors
        .into_iter()
        .take(top_k)
        .map(|c| {
            let score = semantic_score(c.distance);
            Hit {
                id: c.id,
                distance: c.distance,
                score,
                semantic_score: None,
                keyword_score: None,
                threat_score: None,
                metadata: c.metadata,
                preview: sanitized_preview(&c.document, HIT_PREVIEW_CHARS),
            }
        })
        .collect()
}

/// Multi-signal rescoring: weighted fusion, stable descending sort, top-k.
fn rank_hybrid(
    survivors: Vec<IndexMatch>,
    query_text: &str,
    query_profile: &ThreatIntelProfile,
    options: &QueryOptions,
) -> Vec<Hit> {
    let query_tokens = tokenize(query_text);

    let mut hits: Vec<Hit> = survivors
        .into_iter()
        .map(|c| {
            let semantic = semantic_score(c.distance);
            let keyword = keyword_score(&query_tokens, &c.document);
            let threat = threat_score(&query_profile.tags, &c.metadata.threat_tags);
            let score = options.semantic_weight * semantic
                + options.keyword_weight * keyword
                + options.threat_weight * threat;
            Hit {
                id: c.id,
                distance: c.distance,
                score,
                semantic_score: Some(semantic),
                keyword_score: Some(keyword),
                threat_score: Some(threat),
                metadata: c.metadata,
                preview: sanitized_preview(&c.document, HIT_PREVIEW_CHARS),
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(options.top_k);
    hits
}

/// Map a raw index distance to a semantic score in `(0, 1]`.
///
/// Negative distances (possible with some backends' rounding) are clamped
/// to zero, so the score never exceeds 1 and never divides by zero.
pub fn semantic_score(distance: f32) -> f64 {
    1.0 / (1.0 + f64::from(distance.max(0.0)))
}

/// Extract the scoring token set from a text.
///
/// Tokens are lowercase `[a-z0-9_-]` runs longer than two characters, minus
/// the fixed stopword table.
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Share of query tokens present in the candidate text's token set.
///
/// Zero when either token set is empty.
pub fn keyword_score(query_tokens: &HashSet<String>, candidate_text: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokenize(candidate_text);
    if candidate_tokens.is_empty() {
        return 0.0;
    }
    let overlap = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(*t))
        .count();
    overlap as f64 / query_tokens.len() as f64
}

/// Share of the query profile's tags carried by the candidate.
///
/// Zero when the query has no tags or the candidate's tag set is empty.
pub fn threat_score(query_tags: &[String], candidate_tags: &[String]) -> f64 {
    if query_tags.is_empty() || candidate_tags.is_empty() {
        return 0.0;
    }
    let covered = query_tags
        .iter()
        .filter(|t| candidate_tags.contains(t))
        .count();
    covered as f64 / query_tags.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_score_monotonic_and_bounded() {
        assert!(semantic_score(0.1) > semantic_score(0.5));
        assert!(semantic_score(0.5) > semantic_score(2.0));
        assert_eq!(semantic_score(0.0), 1.0);
        // Negative distances clamp to the upper bound instead of exceeding it.
        assert_eq!(semantic_score(-3.0), 1.0);
        assert!(semantic_score(1e9) > 0.0);
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        let tokens = tokenize("The C2 beacon and the DNS tunnel from host-14");
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("c2"));
        assert!(!tokens.contains("and"));
        assert!(tokens.contains("beacon"));
        assert!(tokens.contains("dns"));
        assert!(tokens.contains("tunnel"));
        assert!(tokens.contains("host-14"));
    }

    #[test]
    fn test_tokenize_keeps_cve_ids_whole() {
        let tokens = tokenize("Need ransomware intelligence mapped to CVE-2024-3400");
        assert!(tokens.contains("cve-2024-3400"));
        assert!(tokens.contains("ransomware"));
    }

    #[test]
    fn test_keyword_score_ratio() {
        let query = tokenize("ransomware payload beacon");
        let score = keyword_score(&query, "the ransomware payload was recovered");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_score_empty_sets() {
        assert_eq!(keyword_score(&HashSet::new(), "anything"), 0.0);
        let query = tokenize("ransomware");
        assert_eq!(keyword_score(&query, "a an it"), 0.0);
    }

    #[test]
    fn test_threat_score_coverage() {
        let query = vec!["ransomware".to_string(), "vulnerability".to_string()];
        let candidate = vec!["ransomware".to_string(), "phishing".to_string()];
        assert!((threat_score(&query, &candidate) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_threat_score_empty_sides() {
        let tags = vec!["ransomware".to_string()];
        assert_eq!(threat_score(&[], &tags), 0.0);
        assert_eq!(threat_score(&tags, &[]), 0.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "vector".parse::<RetrievalMode>().unwrap(),
            RetrievalMode::Vector
        );
        assert_eq!(
            "hybrid".parse::<RetrievalMode>().unwrap(),
            RetrievalMode::Hybrid
        );
        assert_eq!(
            "intel".parse::<RetrievalMode>().unwrap(),
            RetrievalMode::Intel
        );
        let err = "bogus".parse::<RetrievalMode>().unwrap_err();
        assert!(err.to_string().contains("Unsupported retrieval mode"));
    }
}
