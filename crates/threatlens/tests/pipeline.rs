//! Full-pipeline tests over the SQLite index in a temporary directory.

use async_trait::async_trait;
use tempfile::TempDir;

use threatlens::index::SqliteIndex;
use threatlens_core::chunk::ChunkMode;
use threatlens_core::embedding::EmbeddingProvider;
use threatlens_core::error::EngineError;
use threatlens_core::index::VectorIndex;
use threatlens_core::ingest::{ingest_document, IngestOptions};
use threatlens_core::models::QueryOptions;
use threatlens_core::retrieve::retrieve;

struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub"
    }
    fn dims(&self) -> usize {
        2
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EngineError> {
        Ok(texts
            .iter()
            .map(|t| vec![t.chars().count() as f32, 1.0])
            .collect())
    }
}

async fn open_index(tmp: &TempDir) -> SqliteIndex {
    SqliteIndex::open(&tmp.path().join("data/tlens.sqlite"), "intel_docs")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sqlite_ingest_then_hybrid_query() {
    let tmp = TempDir::new().unwrap();
    let index = open_index(&tmp).await;

    let options = IngestOptions {
        chunk_size: 1000,
        overlap: 150,
        mode: ChunkMode::Paragraph,
    };

    ingest_document(
        &StubEmbedder,
        &index,
        "docA",
        b"Ransomware operators exploited CVE-2024-3400 for initial access.",
        &options,
    )
    .await
    .unwrap();

    ingest_document(
        &StubEmbedder,
        &index,
        "docB",
        b"Generic phishing awareness guidance for employees.",
        &options,
    )
    .await
    .unwrap();

    assert_eq!(index.count().await.unwrap(), 2);

    let query_options = QueryOptions {
        top_k: 2,
        retrieval_mode: "hybrid".to_string(),
        doc_ids: vec!["docA".to_string()],
        required_threat_tags: vec!["ransomware".to_string()],
        ..Default::default()
    };

    let result = retrieve(
        &StubEmbedder,
        &index,
        "Need ransomware intelligence mapped to CVE-2024-3400",
        &query_options,
    )
    .await
    .unwrap();

    assert_eq!(result.hits.len(), 1);
    assert_eq!(result.hits[0].id, "docA:0");
    assert!(result.hits[0]
        .metadata
        .threat_tags
        .contains(&"ransomware".to_string()));
    assert!(result.hits[0].score >= 0.7 * result.hits[0].semantic_score.unwrap());
}

#[tokio::test]
async fn test_sqlite_index_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();

    {
        let index = open_index(&tmp).await;
        ingest_document(
            &StubEmbedder,
            &index,
            "persisted.txt",
            b"Credential theft via cloud IAM misconfiguration, technique T1078",
            &IngestOptions::default(),
        )
        .await
        .unwrap();
    }

    let reopened = open_index(&tmp).await;
    assert_eq!(reopened.count().await.unwrap(), 1);
    assert_eq!(reopened.doc_count().await.unwrap(), 1);

    let matches = reopened.query(&[64.0, 1.0], 5).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "persisted.txt:0");
    assert!(matches[0]
        .metadata
        .intel_indicators
        .contains(&"T1078".to_string()));
}

#[tokio::test]
async fn test_sqlite_reingest_replaces_entries() {
    let tmp = TempDir::new().unwrap();
    let index = open_index(&tmp).await;
    let opts = IngestOptions::default();

    ingest_document(&StubEmbedder, &index, "doc", b"first revision", &opts)
        .await
        .unwrap();
    ingest_document(&StubEmbedder, &index, "doc", b"second revision", &opts)
        .await
        .unwrap();

    assert_eq!(index.count().await.unwrap(), 1);
    let matches = index.query(&[15.0, 1.0], 5).await.unwrap();
    assert_eq!(matches[0].document, "second revision");
}

#[tokio::test]
async fn test_vector_mode_over_sqlite_orders_by_distance() {
    let tmp = TempDir::new().unwrap();
    let index = open_index(&tmp).await;
    let opts = IngestOptions::default();

    ingest_document(&StubEmbedder, &index, "short", b"malware note", &opts)
        .await
        .unwrap();
    ingest_document(
        &StubEmbedder,
        &index,
        "long",
        b"a considerably longer malware advisory covering a trojan loader campaign",
        &opts,
    )
    .await
    .unwrap();

    let result = retrieve(
        &StubEmbedder,
        &index,
        "malware note",
        &QueryOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.hits.len(), 2);
    assert!(result.hits[0].distance <= result.hits[1].distance);
    assert_eq!(result.hits[0].id, "short:0");
}
