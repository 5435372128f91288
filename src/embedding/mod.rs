//! Embedding provider implementations.
//!
//! Concrete backends for the core [`Embedder`] trait:
//! - **[`DisabledEmbedder`]**: always fails; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: calls the OpenAI embeddings API with retry and backoff.
//! - **[`OllamaEmbedder`]**: calls a local Ollama instance's `/api/embed` endpoint.
//! - **`LocalEmbedder`**: runs a model on-device via fastembed (feature
//!   `local-embeddings`); no network calls after the model download.
//!
//! The indexer and the retriever must use the same provider and model:
//! the corpus is only meaningful against queries embedded the same way.
//!
//! # Provider Selection
//!
//! Use [`create_embedder`] to instantiate the provider named in config:
//!
//! ```rust
//! # use portfolio_rag::config::EmbeddingConfig;
//! # use portfolio_rag::embedding::create_embedder;
//! # use portfolio_rag_core::embedding::Embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

#[cfg(feature = "local-embeddings")]
mod local;

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use portfolio_rag_core::embedding::Embedder;
use portfolio_rag_core::EmbeddingError;

use crate::config::EmbeddingConfig;
use crate::http;

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;

const OPENAI_URL: &str = "https://api.openai.com/v1";
const OLLAMA_URL: &str = "http://localhost:11434";

// ============ Disabled Provider ============

/// An embedding provider that always fails.
///
/// Used when `embedding.provider = "disabled"`. Retrieval against an empty
/// corpus still works, because it never reaches the embedder.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> Option<usize> {
        None
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Disabled)
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Calls `POST {url}/embeddings` with the configured model (the portfolio
/// corpus is built with `text-embedding-3-small`). Requires the
/// `OPENAI_API_KEY` environment variable unless a key is passed explicitly.
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    dims: Option<usize>,
    max_retries: u32,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI provider, reading the key from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set in config, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) => key,
            Err(_) => bail!("OPENAI_API_KEY environment variable not set"),
        };
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &EmbeddingConfig, api_key: impl Into<String>) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;

        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: config.url.clone().unwrap_or_else(|| OPENAI_URL.to_string()),
            api_key: api_key.into(),
            model,
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let json = http::post_json_with_retry(
            &self.client,
            &http::join_url(&self.url, "embeddings"),
            Some(self.api_key.as_str()),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await
        .map_err(|e| EmbeddingError::provider("openai", format!("{:#}", e)))?;

        let vectors =
            parse_openai_response(&json).map_err(|e| EmbeddingError::provider("openai", e))?;
        first_vector(vectors, self.dims)
    }
}

/// Parse the OpenAI embeddings API response JSON.
///
/// Extracts the `data[].embedding` arrays and returns them ordered by
/// each item's `index` field.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, String> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or("Invalid OpenAI response: missing data array")?;

    let mut indexed = Vec::with_capacity(data.len());

    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or("Invalid OpenAI response: missing embedding")?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(position as u64);

        indexed.push((index, json_floats(embedding)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance.
///
/// Calls `POST /api/embed` on the configured URL (default:
/// `http://localhost:11434`). Requires Ollama to be running with an
/// embedding model pulled (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dims: Option<usize>,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;

        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: config.url.clone().unwrap_or_else(|| OLLAMA_URL.to_string()),
            model,
            dims: config.dims,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> Option<usize> {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let json = http::post_json_with_retry(
            &self.client,
            &http::join_url(&self.url, "api/embed"),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await
        .map_err(|e| EmbeddingError::provider("ollama", format!("{:#}", e)))?;

        let vectors =
            parse_ollama_response(&json).map_err(|e| EmbeddingError::provider("ollama", e))?;
        first_vector(vectors, self.dims)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, String> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or("Invalid Ollama response: missing embeddings array")?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .ok_or_else(|| "Invalid Ollama response: embedding is not an array".to_string())
                .and_then(|values| json_floats(values))
        })
        .collect()
}

// ============ Shared helpers ============

fn json_floats(values: &[serde_json::Value]) -> Result<Vec<f32>, String> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| format!("non-numeric embedding component: {}", v))
        })
        .collect()
}

/// Take the single vector of a one-input request and check its length.
fn first_vector(vectors: Vec<Vec<f32>>, dims: Option<usize>) -> Result<Vec<f32>, EmbeddingError> {
    let vector = vectors
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or(EmbeddingError::EmptyResponse)?;

    match dims {
        Some(expected) if expected != vector.len() => Err(EmbeddingError::UnexpectedDims {
            expected,
            found: vector.len(),
        }),
        _ => Ok(vector),
    }
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// # Supported Providers
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"local"` | `LocalEmbedder` (feature `local-embeddings`) |
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider
/// cannot be initialized (missing config, API key, or feature flag).
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        "openai" => Ok(Arc::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config)?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings"),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_response_sorted_by_index() {
        let json = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        let vecs = parse_openai_response(&json).unwrap();
        assert_eq!(vecs, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_openai_response_missing_data() {
        assert!(parse_openai_response(&json!({ "error": "nope" })).is_err());
        assert!(parse_openai_response(&json!({ "data": [{ "index": 0 }] })).is_err());
    }

    #[test]
    fn test_ollama_response() {
        let json = json!({ "model": "nomic-embed-text", "embeddings": [[0.5, -0.25, 1.0]] });
        assert_eq!(
            parse_ollama_response(&json).unwrap(),
            vec![vec![0.5, -0.25, 1.0]]
        );
        assert!(parse_ollama_response(&json!({ "embeddings": [["x"]] })).is_err());
        assert!(parse_ollama_response(&json!({})).is_err());
    }

    #[test]
    fn test_first_vector_checks() {
        assert!(matches!(
            first_vector(vec![], None),
            Err(EmbeddingError::EmptyResponse)
        ));
        assert!(matches!(
            first_vector(vec![vec![]], None),
            Err(EmbeddingError::EmptyResponse)
        ));
        assert!(matches!(
            first_vector(vec![vec![1.0, 2.0]], Some(3)),
            Err(EmbeddingError::UnexpectedDims {
                expected: 3,
                found: 2
            })
        ));
        assert_eq!(first_vector(vec![vec![1.0, 2.0]], Some(2)).unwrap(), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_disabled_embedder_fails() {
        let embedder = create_embedder(&EmbeddingConfig::default()).unwrap();
        assert!(matches!(
            embedder.embed("hello").await,
            Err(EmbeddingError::Disabled)
        ));
    }

    #[test]
    fn test_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "nope".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(create_embedder(&config).is_err());
    }

    #[test]
    fn test_ollama_requires_model() {
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(OllamaEmbedder::new(&config).is_err());
    }
}
