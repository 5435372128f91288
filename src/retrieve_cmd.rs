//! `folio retrieve` and `folio ask`.

use anyhow::{bail, Result};
use std::sync::Arc;

use portfolio_rag_core::{RetrievalParams, Retriever};

use crate::chat;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::corpus::load_corpus_or_empty;
use crate::embedding;

fn build_retriever(config: &Config, params: RetrievalParams) -> Result<Retriever> {
    let corpus = Arc::new(load_corpus_or_empty(&config.corpus.path));
    let embedder = embedding::create_embedder(&config.query_embedding())?;
    Ok(Retriever::new(corpus, embedder, params))
}

/// Print the context block for `query`, or the ranked records with
/// `explain`.
pub async fn run_retrieve(
    config: &Config,
    query: &str,
    k: Option<usize>,
    budget: Option<usize>,
    explain: bool,
) -> Result<()> {
    let mut params = config.retrieval.params();
    if let Some(k) = k {
        params.top_k = k;
    }
    if let Some(budget) = budget {
        if budget == 0 {
            bail!("--budget must be >= 1");
        }
        params.char_budget = budget;
    }

    let retriever = build_retriever(config, params)?;

    if !explain {
        let context = retriever.retrieve(query).await?;
        println!("{}", context);
        return Ok(());
    }

    let top = retriever.search(query, retriever.params().top_k).await?;
    if top.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, scored) in top.iter().enumerate() {
        println!(
            "{}. [{:.4}] {}",
            i + 1,
            scored.similarity,
            scored.record.source_id
        );
        println!("    text: \"{}\"", scored.record.text.replace('\n', " ").trim());
        println!();
    }

    Ok(())
}

/// Answer `question` against the corpus and print the reply.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Prompt is missing");
    }

    let retriever = build_retriever(config, config.retrieval.params())?;
    let completion = CompletionClient::new(&config.completion)?;
    if !completion.is_enabled() {
        bail!("Completion provider is disabled. Set [completion] provider in config.");
    }

    let answer = chat::answer(&retriever, &completion, question).await?;
    println!("{}", answer);

    Ok(())
}
