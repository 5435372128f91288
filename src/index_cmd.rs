//! `folio index`: rebuild the corpus artifact from the SourceDocument feed.

use anyhow::{bail, Context, Result};

use portfolio_rag_core::chunk::chunk_document;
use portfolio_rag_core::index::build_corpus;

use crate::config::Config;
use crate::corpus::{load_sources, write_corpus};
use crate::embedding;

/// Chunk, embed, and write every document. Any embedding failure aborts
/// the run before the previous artifact is touched.
pub async fn run_index(config: &Config, dry_run: bool, concurrency: Option<usize>) -> Result<()> {
    let docs = load_sources(&config.sources.path)?;

    let mut options = config.index_options();
    if let Some(n) = concurrency {
        if n == 0 {
            bail!("--concurrency must be >= 1");
        }
        options.concurrency = n;
    }

    if dry_run {
        let counts: Vec<usize> = docs
            .iter()
            .map(|doc| chunk_document(doc, options.max_chars).len())
            .collect();

        println!("index (dry-run)");
        println!("  documents: {}", docs.len());
        println!("  chunks: {}", counts.iter().sum::<usize>());
        for (doc, count) in docs.iter().zip(&counts) {
            println!("    {}: {}", doc.id, count);
        }
        return Ok(());
    }

    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let embedder = embedding::create_embedder(&config.embedding)?;

    let corpus = build_corpus(&docs, embedder.as_ref(), &options)
        .await
        .context("Indexing aborted; the existing corpus was left unchanged")?;

    write_corpus(&config.corpus.path, &corpus)?;

    println!("index");
    println!("  documents: {}", docs.len());
    println!("  chunks: {}", corpus.len());
    match corpus.dims() {
        Some(d) => println!("  dims: {}", d),
        None => println!("  dims: -"),
    }
    println!("  written: {}", config.corpus.path.display());

    Ok(())
}
