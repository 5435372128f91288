//! Error types shared by the indexing and retrieval pipeline.
//!
//! Each failure domain has its own enum so callers can tell them apart:
//! an [`EmbeddingError`] during query embedding is fatal to that request,
//! a [`CorpusError`] is recovered by falling back to an empty corpus, and a
//! [`SimilarityError`] only ever causes a single record to be skipped.

use thiserror::Error;

/// Failure reported by an embedding collaborator.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider is configured as `disabled`.
    #[error("embedding provider is disabled")]
    Disabled,

    /// The provider call failed (network, HTTP status, or model error).
    #[error("{provider} embedding request failed: {message}")]
    Provider { provider: String, message: String },

    /// The provider answered but returned no vector.
    #[error("embedding provider returned no vector")]
    EmptyResponse,

    /// The returned vector does not have the configured dimensionality.
    #[error("embedding has {found} dimensions, expected {expected}")]
    UnexpectedDims { expected: usize, found: usize },
}

impl EmbeddingError {
    pub fn provider(provider: impl Into<String>, message: impl ToString) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

/// Failure reading or parsing a serialized corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse corpus artifact: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why a similarity score could not be computed for a pair of vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimilarityError {
    #[error("vector length mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("vector has zero magnitude")]
    ZeroNorm,
}

/// Failure of a batch indexing run. No partial corpus is produced.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to embed chunk {chunk_index} of '{source_id}': {source}")]
    Embedding {
        source_id: String,
        chunk_index: usize,
        #[source]
        source: EmbeddingError,
    },

    #[error("chunk {chunk_index} of '{source_id}' has {found} dimensions, corpus uses {expected}")]
    DimensionMismatch {
        source_id: String,
        chunk_index: usize,
        expected: usize,
        found: usize,
    },
}
