//! # ThreatLens
//!
//! **A local-first threat-intelligence document ingestion and hybrid
//! retrieval engine.**
//!
//! ThreatLens chunks documents, profiles them for threat intent, embeds
//! them, and stores them in a local vector index. At query time it fuses
//! semantic similarity, keyword overlap, and threat-intent signals into a
//! single ranked, redacted hit list.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────────────┐   ┌───────────┐
//! │  Files    │──▶│ Ingestion Pipeline │──▶│  SQLite    │
//! │  (bytes)  │   │ chunk+profile+embed│   │ vectors   │
//! └───────────┘   └───────────────────┘   └────┬──────┘
//!                                              │
//!                   ┌──────────────────────────┤
//!                   ▼                          ▼
//!             ┌───────────┐            ┌──────────────┐
//!             │   CLI     │            │ Retrieval     │
//!             │  (tlens)  │◀───────────│ Engine        │
//!             └───────────┘            └──────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **ingestion command** ([`ingest`]) scans the given paths, decodes
//!    each file best-effort, and hands it to the core pipeline.
//! 2. The core pipeline chunks the text, attaches a per-chunk
//!    [`ChunkMetadata`](threatlens_core::models::ChunkMetadata) record with
//!    a threat profile, embeds all chunks in one batch via the configured
//!    **embedding provider** ([`embedding`]), and upserts them into the
//!    **SQLite vector index** ([`index`]).
//! 3. The **query command** ([`search`]) embeds the query, over-fetches
//!    candidates, filters them, and ranks them in vector, hybrid, or intel
//!    mode.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding provider implementations |
//! | [`index`] | SQLite-backed vector index |
//! | [`ingest`] | Filesystem batch ingestion |
//! | [`search`] | Query entry point and output formatting |

pub mod config;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod search;
