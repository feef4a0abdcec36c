//! Query entry point and output formatting.
//!
//! Thin wrapper over the core retrieval engine: assembles
//! [`QueryOptions`] from config defaults plus CLI overrides, connects the
//! configured provider and index, and prints either a human-readable table
//! or JSON.

use anyhow::Result;

use threatlens_core::models::{QueryOptions, RetrievalResult};
use threatlens_core::retrieve::retrieve;

use crate::config::Config;
use crate::embedding::create_provider;
use crate::index::SqliteIndex;

#[allow(clippy::too_many_arguments)]
pub async fn run_query(
    config: &Config,
    query: &str,
    mode: Option<&str>,
    top_k: Option<usize>,
    doc_ids: Vec<String>,
    required_threat_tags: Vec<String>,
    json: bool,
) -> Result<()> {
    let result = query_documents(config, query, mode, top_k, doc_ids, required_threat_tags).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

/// Shared implementation returning structured results.
pub async fn query_documents(
    config: &Config,
    query: &str,
    mode: Option<&str>,
    top_k: Option<usize>,
    doc_ids: Vec<String>,
    required_threat_tags: Vec<String>,
) -> Result<RetrievalResult> {
    let options = QueryOptions {
        top_k: top_k.unwrap_or(config.retrieval.top_k),
        retrieval_mode: mode.unwrap_or("vector").to_string(),
        semantic_weight: config.retrieval.semantic_weight,
        keyword_weight: config.retrieval.keyword_weight,
        threat_weight: config.retrieval.threat_weight,
        doc_ids,
        required_threat_tags,
    };

    let provider = create_provider(&config.embedding)?;
    let index = SqliteIndex::open(&config.index.path, &config.index.collection).await?;

    let result = retrieve(provider.as_ref(), &index, query, &options).await?;

    tracing::info!(
        mode = %result.retrieval_mode,
        hits = result.hits.len(),
        "query complete"
    );

    Ok(result)
}

fn print_result(result: &RetrievalResult) {
    println!("query: {}", result.query);
    println!("mode: {}", result.retrieval_mode);
    if !result.threat_profile.tags.is_empty() {
        println!("query tags: {}", result.threat_profile.tags.join(", "));
    }
    if !result.threat_profile.indicators.is_empty() {
        println!(
            "query indicators: {}",
            result.threat_profile.indicators.join(", ")
        );
    }

    if result.hits.is_empty() {
        println!("no results");
        return;
    }

    for (i, hit) in result.hits.iter().enumerate() {
        println!();
        println!("{}. {} (score {:.4})", i + 1, hit.id, hit.score);
        if let (Some(s), Some(k), Some(t)) =
            (hit.semantic_score, hit.keyword_score, hit.threat_score)
        {
            println!("   semantic {:.4} | keyword {:.4} | threat {:.4}", s, k, t);
        }
        if !hit.metadata.threat_tags.is_empty() {
            println!("   tags: {}", hit.metadata.threat_tags.join(", "));
        }
        println!("   {}", hit.preview);
    }
}
