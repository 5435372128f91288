//! Embedding provider trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus [`cosine_similarity`], the only scoring function the retriever uses.
//!
//! Concrete providers (OpenAI, Ollama, fastembed) live in the
//! `portfolio-rag` app crate.

use async_trait::async_trait;

use crate::error::{EmbeddingError, SimilarityError};

/// A text-embedding model.
///
/// Both the indexer and the retriever embed through this trait, so they
/// must be handed the same model: vectors from different models are not
/// comparable even when their lengths agree.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Returns the expected vector dimensionality, or `None` if unknown
    /// until the first response.
    fn dims(&self) -> Option<usize>;

    /// Embed a single text. One request per call; no batching.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// # Errors
///
/// - [`SimilarityError::DimensionMismatch`] if the lengths differ.
/// - [`SimilarityError::ZeroNorm`] if either vector has zero magnitude
///   (this includes empty vectors), where the ratio is undefined.
///
/// # Example
///
/// ```rust
/// use portfolio_rag_core::embedding::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 0.0], &[0.9, 0.1]).unwrap();
/// assert!((sim - 0.9939).abs() < 1e-3);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(SimilarityError::ZeroNorm);
    }

    Ok((dot / denom).clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_symmetric() {
        let a = vec![0.3, -1.2, 4.0, 0.01];
        let b = vec![2.5, 0.7, -0.4, 9.0];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let a = vec![0.3, -1.2, 4.0];
        let b = vec![2.5, 0.7, -0.4];
        let a2: Vec<f32> = a.iter().map(|x| x * 2.0).collect();
        let base = cosine_similarity(&a, &b).unwrap();
        let scaled = cosine_similarity(&a2, &b).unwrap();
        assert!((base - scaled).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_near_parallel() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.9, 0.1]).unwrap();
        assert!((sim - 0.993_883_7).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]),
            Err(SimilarityError::ZeroNorm)
        );
        assert_eq!(
            cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]),
            Err(SimilarityError::ZeroNorm)
        );
    }

    #[test]
    fn test_cosine_empty() {
        assert_eq!(cosine_similarity(&[], &[]), Err(SimilarityError::ZeroNorm));
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(
            cosine_similarity(&[1.0, 2.0], &[1.0]),
            Err(SimilarityError::DimensionMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_cosine_non_finite_input() {
        assert!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]).is_err());
    }
}
