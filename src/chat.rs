//! Retrieval-augmented answering: context lookup, prompt assembly, completion.

use thiserror::Error;

use portfolio_rag_core::prompt::build_messages;
use portfolio_rag_core::{EmbeddingError, Retriever};

use crate::completion::CompletionClient;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The question could not be embedded, so no context was obtainable.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbeddingError),

    #[error("completion failed: {0:#}")]
    Completion(anyhow::Error),
}

/// Answer `prompt` using context retrieved for it.
///
/// An empty context is not an error: the model is still asked, with an
/// empty context block appended to the instruction.
pub async fn answer(
    retriever: &Retriever,
    completion: &CompletionClient,
    prompt: &str,
) -> Result<String, ChatError> {
    let context = retriever.retrieve(prompt).await?;
    tracing::debug!(context_chars = context.chars().count(), "assembled context");

    let messages = build_messages(completion.system_prompt(), &context, prompt);
    completion
        .complete(&messages)
        .await
        .map_err(ChatError::Completion)
}
