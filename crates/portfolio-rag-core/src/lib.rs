//! # Portfolio RAG Core
//!
//! Shared logic for the portfolio question-answering pipeline: data
//! models, sentence chunking, the embedding trait, the offline indexing
//! run, cosine-similarity retrieval, and chat prompt assembly.
//!
//! This crate contains no tokio, HTTP client, or filesystem I/O. Concrete
//! embedding providers and corpus persistence live in the `portfolio-rag`
//! app crate and are passed in by the caller.
//!
//! ```text
//! SourceDocument ─▶ chunk::split_text ─▶ Embedder ─▶ Corpus
//!                                                     │
//!             query ─▶ Embedder ─▶ Retriever::rank ◀──┘
//!                                       │
//!                                       ▼
//!                               context block ─▶ prompt::build_messages
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod prompt;
pub mod retrieve;

pub use error::{CorpusError, EmbeddingError, IndexError, SimilarityError};
pub use models::{Chunk, Corpus, EmbeddingRecord, ScoredRecord, SourceDocument};
pub use retrieve::{RetrievalParams, Retriever};
