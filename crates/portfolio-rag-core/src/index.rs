//! Offline indexing run: documents → chunks → embeddings → [`Corpus`].
//!
//! Every chunk of every document is embedded, and the resulting records
//! keep (document, chunk) order. Up to `concurrency` embedding requests
//! may be in flight at once; results are reassembled in submission order,
//! so the output is identical to a sequential run.
//!
//! The run is all-or-nothing: the first embedding failure, empty vector,
//! or dimensionality disagreement aborts it and no corpus is returned.

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::chunk::{chunk_document, DEFAULT_MAX_CHARS};
use crate::embedding::Embedder;
use crate::error::{EmbeddingError, IndexError};
use crate::models::{Chunk, Corpus, EmbeddingRecord, SourceDocument};

/// Settings for a single indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Soft chunk length target, in characters.
    pub max_chars: usize,
    /// Maximum embedding requests in flight. `1` is fully sequential.
    pub concurrency: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            concurrency: 1,
        }
    }
}

/// Chunk every document in input order, without embedding.
pub fn plan_chunks(docs: &[SourceDocument], max_chars: usize) -> Vec<Chunk> {
    docs.iter()
        .flat_map(|doc| chunk_document(doc, max_chars))
        .collect()
}

/// Chunk and embed `docs`, returning the complete corpus.
pub async fn build_corpus(
    docs: &[SourceDocument],
    embedder: &dyn Embedder,
    opts: &IndexOptions,
) -> Result<Corpus, IndexError> {
    let chunks = plan_chunks(docs, opts.max_chars);
    let total = chunks.len();
    tracing::info!(
        documents = docs.len(),
        chunks = total,
        model = embedder.model_name(),
        concurrency = opts.concurrency.max(1),
        "indexing"
    );

    let records: Vec<EmbeddingRecord> = stream::iter(chunks)
        .map(|chunk| embed_chunk(embedder, chunk))
        .buffered(opts.concurrency.max(1))
        .try_collect()
        .await?;

    let mut expected = embedder.dims();
    for (position, record) in records.iter().enumerate() {
        let found = record.embedding.len();
        match expected {
            Some(dims) if dims != found => {
                return Err(IndexError::DimensionMismatch {
                    source_id: record.source_id.clone(),
                    chunk_index: chunk_position(&records, position),
                    expected: dims,
                    found,
                });
            }
            Some(_) => {}
            None => expected = Some(found),
        }
    }

    tracing::info!(records = records.len(), dims = ?expected, "indexing complete");
    Ok(Corpus::new(records))
}

async fn embed_chunk(embedder: &dyn Embedder, chunk: Chunk) -> Result<EmbeddingRecord, IndexError> {
    tracing::debug!(source_id = %chunk.source_id, chunk = chunk.index, "embedding chunk");

    let fail = |source: EmbeddingError, chunk: &Chunk| IndexError::Embedding {
        source_id: chunk.source_id.clone(),
        chunk_index: chunk.index,
        source,
    };

    let embedding = embedder
        .embed(&chunk.text)
        .await
        .map_err(|e| fail(e, &chunk))?;
    if embedding.is_empty() {
        return Err(fail(EmbeddingError::EmptyResponse, &chunk));
    }

    Ok(EmbeddingRecord {
        source_id: chunk.source_id,
        text: chunk.text,
        embedding,
    })
}

/// Index of `records[position]` within its own document.
fn chunk_position(records: &[EmbeddingRecord], position: usize) -> usize {
    let source_id = &records[position].source_id;
    records[..position]
        .iter()
        .rev()
        .take_while(|r| &r.source_id == source_id)
        .count()
}
