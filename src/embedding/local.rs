//! On-device embeddings via fastembed (ONNX Runtime, bundled binaries).
//!
//! The model is downloaded from Hugging Face on first use and cached.
//! Inference runs on the blocking thread pool; the loaded model is kept
//! behind a mutex and reused across calls.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use portfolio_rag_core::embedding::Embedder;
use portfolio_rag_core::EmbeddingError;

use crate::config::EmbeddingConfig;

const DEFAULT_LOCAL_MODEL: &str = "all-minilm-l6-v2";

pub struct LocalEmbedder {
    model_name: String,
    dims: usize,
    model: fastembed::EmbeddingModel,
    loaded: Arc<Mutex<Option<fastembed::TextEmbedding>>>,
}

impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_name = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string());
        let model = config_to_fastembed_model(&model_name)?;
        let dims = config.dims.unwrap_or(match model_name.as_str() {
            "bge-base-en-v1.5" | "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => 768,
            "bge-large-en-v1.5" => 1024,
            _ => 384,
        });

        Ok(Self {
            model_name,
            dims,
            model,
            loaded: Arc::new(Mutex::new(None)),
        })
    }
}

fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV1),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1, nomic-embed-text-v1.5",
            other
        ),
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> Option<usize> {
        Some(self.dims)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let loaded = Arc::clone(&self.loaded);
        let model = self.model.clone();
        let text = text.to_string();

        let vectors = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut guard = loaded
                .lock()
                .map_err(|_| anyhow::anyhow!("local embedding model lock poisoned"))?;
            if guard.is_none() {
                let init = fastembed::InitOptions::new(model).with_show_download_progress(true);
                let embedding = fastembed::TextEmbedding::try_new(init).map_err(|e| {
                    anyhow::anyhow!("Failed to initialize local embedding model: {}", e)
                })?;
                *guard = Some(embedding);
            }
            let embedding = guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("local embedding model unavailable"))?;
            embedding
                .embed(vec![text], None)
                .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
        })
        .await
        .map_err(|e| EmbeddingError::provider("local", e))?
        .map_err(|e| EmbeddingError::provider("local", format!("{:#}", e)))?;

        let vector = vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::EmptyResponse)?;
        if vector.len() != self.dims {
            return Err(EmbeddingError::UnexpectedDims {
                expected: self.dims,
                found: vector.len(),
            });
        }
        Ok(vector)
    }
}
