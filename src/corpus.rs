//! Corpus artifact persistence.
//!
//! The artifact is a pretty-printed JSON array of
//! `{ "id", "text", "embedding" }` records. It is written once per
//! indexing run (full rebuild) and read once at process start.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use portfolio_rag_core::{Corpus, CorpusError, SourceDocument};

/// Read and parse the corpus artifact at `path`.
///
/// Malformed individual records are skipped with a warning; an unreadable
/// or unparseable file is an error.
pub fn load_corpus(path: &Path) -> Result<Corpus, CorpusError> {
    let content = std::fs::read_to_string(path)?;
    let (corpus, skipped) = Corpus::from_json(&content)?;

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "corpus contained malformed records");
    }
    if let Some(dims) = corpus.dims() {
        let mismatched = corpus
            .records()
            .iter()
            .filter(|r| r.embedding.len() != dims)
            .count();
        if mismatched > 0 {
            tracing::warn!(
                path = %path.display(),
                mismatched,
                dims,
                "corpus records disagree on dimensionality; they will be skipped at query time"
            );
        }
    }

    tracing::info!(path = %path.display(), records = corpus.len(), dims = ?corpus.dims(), "loaded corpus");
    Ok(corpus)
}

/// Load the corpus, substituting an empty one if it cannot be read.
///
/// A missing knowledge base must not take down the chat endpoint: every
/// query against the empty corpus simply yields no context.
pub fn load_corpus_or_empty(path: &Path) -> Corpus {
    match load_corpus(path) {
        Ok(corpus) => corpus,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load corpus; serving with an empty knowledge base"
            );
            Corpus::empty()
        }
    }
}

/// Write the corpus to `path`, replacing any previous artifact.
///
/// The data goes to a temporary sibling first and is renamed into place,
/// so readers never observe a half-written file.
pub fn write_corpus(path: &Path, corpus: &Corpus) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = corpus.to_json_pretty()?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write corpus: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move corpus into place: {}", path.display()))?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "corpus.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read the SourceDocument feed: a JSON array of `{ "id", "text" }`.
pub fn load_sources(path: &Path) -> Result<Vec<SourceDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sources file: {}", path.display()))
}
