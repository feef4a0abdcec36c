//! Filesystem batch ingestion.
//!
//! Expands the paths given on the command line (files directly; directories
//! filtered by the configured include globs), reads each file as raw bytes,
//! and runs the core ingestion pipeline per document. One document's failure
//! is logged and does not abort the batch — each document is atomic on its
//! own.

use std::path::PathBuf;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use threatlens_core::chunk::ChunkMode;
use threatlens_core::ingest::{ingest_document, IngestOptions};

use crate::config::Config;
use crate::embedding::create_provider;
use crate::index::SqliteIndex;

pub async fn run_ingest(config: &Config, paths: &[PathBuf], mode_override: Option<&str>) -> Result<()> {
    let mode: ChunkMode = mode_override
        .unwrap_or(&config.chunking.mode)
        .parse()?;

    let options = IngestOptions {
        chunk_size: config.chunking.chunk_size,
        overlap: config.chunking.overlap,
        mode,
    };

    let provider = create_provider(&config.embedding)?;
    let index = SqliteIndex::open(&config.index.path, &config.index.collection).await?;

    let files = collect_files(paths, &config.ingest.include_globs)?;
    if files.is_empty() {
        anyhow::bail!("No ingestable files found under the given paths");
    }

    let mut ingested = 0u64;
    let mut chunks_written = 0u64;
    let mut failed = 0u64;

    for file in &files {
        let doc_id = match file.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!("Skipping path with non-UTF-8 file name: {}", file.display());
                failed += 1;
                continue;
            }
        };

        let raw = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file.display(), e);
                failed += 1;
                continue;
            }
        };

        match ingest_document(provider.as_ref(), &index, &doc_id, &raw, &options).await {
            Ok(summary) => {
                tracing::info!(
                    doc_id = %summary.doc_id,
                    chunks = summary.chunks,
                    tags = ?summary.threat_tags,
                    "ingested document"
                );
                ingested += 1;
                chunks_written += summary.chunks as u64;
            }
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", doc_id, e);
                failed += 1;
            }
        }
    }

    println!("ingest");
    println!("  files found: {}", files.len());
    println!("  ingested documents: {}", ingested);
    println!("  chunks written: {}", chunks_written);
    if failed > 0 {
        println!("  failed: {}", failed);
    }
    println!("ok");

    Ok(())
}

/// Expand CLI paths into a flat, sorted list of ingestable files.
fn collect_files(paths: &[PathBuf], include_globs: &[String]) -> Result<Vec<PathBuf>> {
    let globs = build_globset(include_globs)?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(false) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
                if globs.is_match(relative) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid include glob: {}", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_collect_files_filters_by_glob() {
        let tmp = std::env::temp_dir().join("tlens-collect-files");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(tmp.join("sub")).unwrap();
        std::fs::write(tmp.join("a.md"), "alpha").unwrap();
        std::fs::write(tmp.join("sub/b.txt"), "beta").unwrap();
        std::fs::write(tmp.join("c.bin"), [0u8, 1, 2]).unwrap();

        let globs = vec!["**/*.md".to_string(), "**/*.txt".to_string()];
        let files = collect_files(&[tmp.clone()], &globs).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.ends_with("a.md")));
        assert!(files.iter().any(|f| f.ends_with(Path::new("sub/b.txt"))));
    }

    #[test]
    fn test_collect_files_takes_explicit_file_regardless_of_glob() {
        let tmp = std::env::temp_dir().join("tlens-collect-explicit");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let file = tmp.join("report.pdf.txt.bin");
        std::fs::write(&file, "data").unwrap();

        let globs = vec!["**/*.md".to_string()];
        let files = collect_files(&[file.clone()], &globs).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_collect_files_missing_path_errors() {
        let globs = vec!["**/*.md".to_string()];
        let missing = PathBuf::from("/definitely/not/here");
        assert!(collect_files(&[missing], &globs).is_err());
    }
}
