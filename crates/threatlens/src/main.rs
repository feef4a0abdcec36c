//! # ThreatLens CLI (`tlens`)
//!
//! The `tlens` binary is the primary interface for ThreatLens. It provides
//! commands for index initialization, document ingestion, retrieval, and
//! index statistics.
//!
//! ## Usage
//!
//! ```bash
//! tlens --config ./config/threatlens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tlens init` | Create the index database and collection |
//! | `tlens ingest <paths…>` | Chunk, profile, embed, and index documents |
//! | `tlens query "<text>"` | Retrieve ranked, redacted hits |
//! | `tlens stats` | Show entry and document counts |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the index
//! tlens init
//!
//! # Ingest a directory of intel reports, paragraph-aligned
//! tlens ingest ./reports --mode paragraph
//!
//! # Hybrid retrieval with a required tag
//! tlens query "ransomware mapped to CVE-2024-3400" --mode hybrid --require-tag ransomware
//!
//! # Machine-readable output
//! tlens query "lateral movement" --mode intel --json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use threatlens::config::load_config;
use threatlens::index::SqliteIndex;
use threatlens::ingest::run_ingest;
use threatlens::search::run_query;

/// ThreatLens — a local-first threat-intelligence ingestion and hybrid
/// retrieval engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/threatlens.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tlens",
    about = "ThreatLens — local threat-intelligence ingestion and hybrid retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/threatlens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the index database and collection.
    ///
    /// Creates the SQLite file and the configured collection. Idempotent —
    /// running it multiple times is safe.
    Init,

    /// Ingest documents from files or directories.
    ///
    /// Files are read as raw bytes and decoded best-effort; directories are
    /// scanned with the configured include globs. Each document is chunked,
    /// threat-profiled, embedded in one batch, and written atomically. A
    /// failing document is reported and skipped; the batch continues.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Chunking mode override: `fixed` or `paragraph`.
        #[arg(long)]
        mode: Option<String>,
    },

    /// Retrieve ranked hits for a query.
    Query {
        /// Query text.
        query: String,

        /// Retrieval mode: `vector`, `hybrid`, or `intel`.
        #[arg(long)]
        mode: Option<String>,

        /// Maximum number of hits.
        #[arg(long)]
        top_k: Option<usize>,

        /// Restrict hits to these document ids (repeatable).
        #[arg(long = "doc-id")]
        doc_ids: Vec<String>,

        /// Require every hit to carry these threat tags (repeatable).
        #[arg(long = "require-tag")]
        require_tags: Vec<String>,

        /// Emit the full result as pretty-printed JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let index = SqliteIndex::open(&config.index.path, &config.index.collection).await?;
            println!(
                "initialized {} (collection: {})",
                config.index.path.display(),
                index.collection()
            );
        }
        Commands::Ingest { paths, mode } => {
            run_ingest(&config, &paths, mode.as_deref()).await?;
        }
        Commands::Query {
            query,
            mode,
            top_k,
            doc_ids,
            require_tags,
            json,
        } => {
            run_query(
                &config,
                &query,
                mode.as_deref(),
                top_k,
                doc_ids,
                require_tags,
                json,
            )
            .await?;
        }
        Commands::Stats => {
            use threatlens_core::index::VectorIndex;

            let index = SqliteIndex::open(&config.index.path, &config.index.collection).await?;
            let entries = index.count().await?;
            let docs = index.doc_count().await?;
            println!("collection: {}", index.collection());
            println!("  documents: {}", docs);
            println!("  entries: {}", entries);
        }
    }

    Ok(())
}
