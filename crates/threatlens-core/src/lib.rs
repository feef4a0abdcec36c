//! # ThreatLens Core
//!
//! Shared, I/O-free logic for ThreatLens: data models, text chunking,
//! threat profile extraction, preview redaction, the index and embedding
//! traits, and the ingestion and retrieval pipelines.
//!
//! This crate contains no tokio, sqlx, filesystem access, or other
//! native-only dependencies. The two blocking boundaries — embedding and
//! the vector index — are reached through the [`embedding::EmbeddingProvider`]
//! and [`index::VectorIndex`] traits, injected by the calling application.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod sanitize;
pub mod threat;

pub use error::EngineError;
