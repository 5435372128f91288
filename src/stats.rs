//! Corpus statistics.
//!
//! Gives a quick summary of what the artifact holds: record count,
//! dimensionality, and a per-source breakdown. Used by `folio stats` to
//! confirm an indexing run produced what was expected.

use anyhow::Result;

use crate::config::Config;
use crate::corpus::load_corpus;

/// Load the artifact and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let path = &config.corpus.path;
    let corpus = load_corpus(path)?;
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("Corpus Stats");
    println!("============");
    println!();
    println!("  Artifact:    {}", path.display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Records:     {}", corpus.len());
    match corpus.dims() {
        Some(d) => println!("  Dims:        {}", d),
        None => println!("  Dims:        -"),
    }

    let sources = corpus.source_ids();
    if !sources.is_empty() {
        println!();
        println!("  By source:");
        let width = sources.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
        for (id, count) in &sources {
            println!("    {:<width$}  {} chunks", id, count, width = width);
        }
    }

    if let (Some(configured), Some(actual)) = (config.embedding.dims, corpus.dims()) {
        if configured != actual {
            println!();
            println!(
                "  Warning: embedding.dims is {} but the corpus has {}-dimensional vectors; re-run `folio index`.",
                configured, actual
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
