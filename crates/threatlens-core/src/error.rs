//! Engine error taxonomy.
//!
//! The two pipeline entry points ([`crate::ingest::ingest_document`] and
//! [`crate::retrieve::retrieve`]) return [`EngineError`] so that hosts can
//! map failure kinds (service-unavailable vs rejected-input) without
//! matching on message strings. Backend failures from a store or network
//! call are wrapped, never swallowed.

use thiserror::Error;

/// Error returned by the ingestion and retrieval pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The embedding backend or vector index is not reachable or not ready.
    ///
    /// Surfaced immediately, never retried by the engine. Transport layers
    /// typically map this to a service-unavailable response.
    #[error("service unavailable: {0}")]
    ProviderUnavailable(String),

    /// The caller supplied an argument the engine rejects up front.
    ///
    /// No partial side effect has occurred when this is returned.
    #[error("{0}")]
    InvalidArgument(String),

    /// Any other failure from a storage or network backend.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl EngineError {
    /// Shorthand for an [`EngineError::InvalidArgument`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    /// Shorthand for an [`EngineError::ProviderUnavailable`] with a formatted message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        EngineError::ProviderUnavailable(msg.into())
    }
}
