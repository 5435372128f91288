//! Flat cosine-similarity retrieval over an in-memory [`Corpus`].
//!
//! The [`Retriever`] is constructed once with the corpus and the embedding
//! provider it should use for queries. Each call embeds the query, scores
//! every record, keeps the top `k`, and joins their text into a context
//! block capped at a character budget.
//!
//! # Algorithm
//!
//! 1. Embed the query (the only step that can fail).
//! 2. Score each record with [`cosine_similarity`]. Records whose score is
//!    undefined (length mismatch, zero magnitude) are skipped.
//! 3. Stable-sort by similarity, descending. Ties keep corpus order.
//! 4. Keep the first `k`.
//! 5. Join texts with the separator and cut to `char_budget` characters.

use std::sync::Arc;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::EmbeddingError;
use crate::models::{Corpus, ScoredRecord};

/// Retrieval tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalParams {
    /// Number of records to keep.
    pub top_k: usize,
    /// Maximum characters in the returned context block.
    pub char_budget: usize,
    /// Placed between record texts in the context block.
    pub separator: String,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 4,
            char_budget: 2000,
            separator: "\n".to_string(),
        }
    }
}

/// Ranks corpus records against free-text queries.
///
/// Holds a shared, read-only [`Corpus`]; any number of retrievals may run
/// concurrently against the same instance.
pub struct Retriever {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    params: RetrievalParams,
}

impl Retriever {
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<dyn Embedder>, params: RetrievalParams) -> Self {
        Self {
            corpus,
            embedder,
            params,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Score every record against `query_vec` and return the best `k`.
    ///
    /// Never fails: records that cannot be scored are skipped and reported
    /// in a single warning.
    pub fn rank(&self, query_vec: &[f32], k: usize) -> Vec<ScoredRecord<'_>> {
        rank_records(&self.corpus, query_vec, k)
    }

    /// Embed `query` and return the top `k` scored records.
    ///
    /// An empty corpus or a blank query returns no records without calling
    /// the embedder.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredRecord<'_>>, EmbeddingError> {
        if self.corpus.is_empty() || query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;
        if query_vec.is_empty() {
            return Err(EmbeddingError::EmptyResponse);
        }

        Ok(self.rank(&query_vec, k))
    }

    /// Produce the context block for `query` using the configured params.
    ///
    /// Returns an empty string when nothing relevant is available; callers
    /// treat that as "no context", not as a failure.
    pub async fn retrieve(&self, query: &str) -> Result<String, EmbeddingError> {
        let top = self.search(query, self.params.top_k).await?;
        tracing::debug!(
            records = top.len(),
            best = ?top.first().map(|s| s.similarity),
            "retrieved context"
        );
        Ok(build_context(
            &top,
            &self.params.separator,
            self.params.char_budget,
        ))
    }
}

/// Score and rank `corpus` records against `query_vec`, keeping `k`.
pub fn rank_records<'a>(corpus: &'a Corpus, query_vec: &[f32], k: usize) -> Vec<ScoredRecord<'a>> {
    let mut skipped = 0usize;

    let mut scored: Vec<ScoredRecord<'a>> = corpus
        .records()
        .iter()
        .filter_map(|record| match cosine_similarity(&record.embedding, query_vec) {
            Ok(similarity) => Some(ScoredRecord { record, similarity }),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(
            skipped,
            query_dims = query_vec.len(),
            corpus_dims = ?corpus.dims(),
            "skipped corpus records that could not be scored"
        );
    }

    // `sort_by` is stable, so equal scores keep corpus order.
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(k);
    scored
}

/// Join record texts with `separator`, then cut to `char_budget` characters.
///
/// The cut is a hard one and may land mid-word.
pub fn build_context(records: &[ScoredRecord<'_>], separator: &str, char_budget: usize) -> String {
    let joined = records
        .iter()
        .map(|s| s.record.text.as_str())
        .collect::<Vec<_>>()
        .join(separator);

    truncate_chars(&joined, char_budget)
}

/// Keep at most `max_chars` Unicode scalar values of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
