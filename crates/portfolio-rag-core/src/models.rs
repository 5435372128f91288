//! Core data models that flow through the indexing and retrieval pipeline.
//!
//! - [`SourceDocument`]: one authored unit of knowledge (a biography
//!   paragraph, a project write-up).
//! - [`Chunk`]: a sentence-aligned slice of a document.
//! - [`EmbeddingRecord`]: a chunk plus its vector; the unit stored at rest.
//! - [`Corpus`]: the ordered, read-only set of records.
//! - [`ScoredRecord`]: a record paired with its similarity to one query.

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// One logical unit of knowledge, authored externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
}

/// A contiguous, sentence-aligned piece of a [`SourceDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source_id: String,
    /// Position of this chunk within its document, starting at 0.
    pub index: usize,
    pub text: String,
}

/// A chunk and its embedding vector.
///
/// Serialized as `{ "id", "text", "embedding" }`, where `id` carries the
/// source document id. `sourceId` and `source_id` are accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    #[serde(rename = "id", alias = "sourceId", alias = "source_id")]
    pub source_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An [`EmbeddingRecord`] scored against a single query.
///
/// Borrowed from the corpus; lives only for the duration of one retrieval.
#[derive(Debug, Clone, Copy)]
pub struct ScoredRecord<'a> {
    pub record: &'a EmbeddingRecord,
    pub similarity: f32,
}

/// Ordered, immutable collection of [`EmbeddingRecord`]s.
///
/// Built once by the indexer or parsed once from the artifact, then shared
/// read-only (typically behind an `Arc`) for the life of the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    records: Vec<EmbeddingRecord>,
}

impl Corpus {
    pub fn new(records: Vec<EmbeddingRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality of the first record, or `None` for an empty corpus.
    pub fn dims(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }

    /// Distinct source ids with their chunk counts, in first-seen order.
    pub fn source_ids(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = Vec::new();
        for record in &self.records {
            match out.iter_mut().find(|(id, _)| *id == record.source_id) {
                Some((_, count)) => *count += 1,
                None => out.push((record.source_id.as_str(), 1)),
            }
        }
        out
    }

    /// Parse a serialized corpus.
    ///
    /// The top level must be a JSON array. Entries that do not deserialize
    /// as an [`EmbeddingRecord`] are skipped and counted in the returned
    /// tally rather than failing the whole artifact.
    pub fn from_json(json: &str) -> Result<(Self, usize), CorpusError> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut records = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;

        for (i, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<EmbeddingRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "skipping malformed corpus record");
                    skipped += 1;
                }
            }
        }

        Ok((Self { records }, skipped))
    }

    /// Serialize as a pretty-printed JSON array.
    pub fn to_json_pretty(&self) -> Result<String, CorpusError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}
