//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing section takes its defaults. The
//! file itself must exist, so a typo in `--config` is reported instead of
//! silently running with defaults.
//!
//! ```toml
//! [corpus]
//! path = "data/embeddings.json"
//!
//! [sources]
//! path = "data/data.json"
//!
//! [chunking]
//! max_chars = 200
//!
//! [retrieval]
//! top_k = 4
//! char_budget = 2000
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! dims = 1536
//!
//! [completion]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use portfolio_rag_core::index::IndexOptions;
use portfolio_rag_core::prompt::DEFAULT_SYSTEM_PROMPT;
use portfolio_rag_core::RetrievalParams;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub sources: SourcesConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/embeddings.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/data.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_char_budget")]
    pub char_budget: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Retries for embedding a query. Indexing uses `embedding.max_retries`;
    /// a query failure is reported to the caller right away by default.
    #[serde(default)]
    pub query_max_retries: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            char_budget: default_char_budget(),
            separator: default_separator(),
            query_max_retries: 0,
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_char_budget() -> usize {
    2000
}
fn default_separator() -> String {
    "\n".to_string()
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            top_k: self.top_k,
            char_budget: self.char_budget,
            separator: self.separator.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (e.g. an OpenAI-compatible proxy or a remote Ollama).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> usize {
    1
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_completion_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_completion_model(),
            url: None,
            timeout_secs: default_completion_timeout_secs(),
            max_retries: default_completion_max_retries(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_completion_timeout_secs() -> u64 {
    60
}
fn default_completion_max_retries() -> u32 {
    2
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Config {
    /// Embedding settings for the query path: same provider and model as
    /// indexing, with `retrieval.query_max_retries` in place of the
    /// indexing retry budget.
    pub fn query_embedding(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            max_retries: self.retrieval.query_max_retries,
            ..self.embedding.clone()
        }
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            max_chars: self.chunking.max_chars,
            concurrency: self.embedding.concurrency,
        }
    }

    /// Resolve relative artifact paths against `base` (the config file's
    /// directory), so commands behave the same from any working directory.
    fn resolve_paths(&mut self, base: &Path) {
        if self.corpus.path.is_relative() {
            self.corpus.path = base.join(&self.corpus.path);
        }
        if self.sources.path.is_relative() {
            self.sources.path = base.join(&self.sources.path);
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }

    Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_chars == 0 {
        bail!("chunking.max_chars must be > 0");
    }

    if config.retrieval.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.char_budget == 0 {
        bail!("retrieval.char_budget must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0 when set");
    }
    if config.embedding.concurrency == 0 {
        bail!("embedding.concurrency must be >= 1");
    }

    match config.completion.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown completion provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}
