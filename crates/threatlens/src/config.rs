use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// SQLite database file holding the vector index.
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "intel_docs".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// `"fixed"` or `"paragraph"`.
    #[serde(default = "default_chunk_mode")]
    pub mode: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            mode: default_chunk_mode(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    150
}
fn default_chunk_mode() -> String {
    "fixed".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    #[serde(default = "default_threat_weight")]
    pub threat_weight: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            threat_weight: default_threat_weight(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_semantic_weight() -> f64 {
    0.7
}
fn default_keyword_weight() -> f64 {
    0.2
}
fn default_threat_weight() -> f64 {
    0.1
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"disabled"`, `"ollama"`, or `"openai"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL of the Ollama instance.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Glob patterns applied when an ingest path is a directory.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    config
        .chunking
        .mode
        .parse::<threatlens_core::chunk::ChunkMode>()?;

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    for (name, weight) in [
        ("semantic_weight", config.retrieval.semantic_weight),
        ("keyword_weight", config.retrieval.keyword_weight),
        ("threat_weight", config.retrieval.threat_weight),
    ] {
        if weight < 0.0 {
            anyhow::bail!("retrieval.{} must be >= 0", name);
        }
    }

    // Validate embedding
    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }

    match config.embedding.provider.as_str() {
        "disabled" | "ollama" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, ollama, or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("threatlens.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let tmp = std::env::temp_dir().join("tlens-config-minimal");
        std::fs::create_dir_all(&tmp).unwrap();
        let path = write_config(&tmp, "[index]\npath = \"./data/tlens.sqlite\"\n");

        let config = load_config(&path).unwrap();
        assert_eq!(config.index.collection, "intel_docs");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.overlap, 150);
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.semantic_weight - 0.7).abs() < 1e-9);
        assert_eq!(config.embedding.provider, "disabled");
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let tmp = std::env::temp_dir().join("tlens-config-zero");
        std::fs::create_dir_all(&tmp).unwrap();
        let path = write_config(
            &tmp,
            "[index]\npath = \"./x.sqlite\"\n\n[chunking]\nchunk_size = 0\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let tmp = std::env::temp_dir().join("tlens-config-provider");
        std::fs::create_dir_all(&tmp).unwrap();
        let path = write_config(
            &tmp,
            "[index]\npath = \"./x.sqlite\"\n\n[embedding]\nprovider = \"magic\"\nmodel = \"m\"\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_unknown_chunk_mode() {
        let tmp = std::env::temp_dir().join("tlens-config-mode");
        std::fs::create_dir_all(&tmp).unwrap();
        let path = write_config(
            &tmp,
            "[index]\npath = \"./x.sqlite\"\n\n[chunking]\nmode = \"semantic\"\n",
        );
        assert!(load_config(&path).is_err());
    }
}
