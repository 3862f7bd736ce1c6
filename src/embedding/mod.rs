//! Embedding provider seam
//!
//! The pipeline consumes embeddings through a narrow trait; the model that
//! produces them is an external collaborator. The shipped implementation
//! calls the Ollama embeddings endpoint.

use crate::errors::{QaError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_EMBEDDING_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Request timeout for a single embedding call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps text to fixed-dimension vectors. Implementations must be
/// deterministic: identical input yields an identical vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of produced vectors
    fn dimension(&self) -> usize;

    /// Embed a batch of texts; the default loops the single-text call
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Ollama embeddings client
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Create a client with custom endpoint, model, and expected dimension
    pub fn with_config(base_url: &str, model: &str, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(QaError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            dimension,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::BackendUnreachable(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(QaError::BackendUnreachable(format!(
                "embedding HTTP {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| QaError::Stream(format!("failed to parse embedding response: {e}")))?;

        if parsed.embedding.len() != self.dimension {
            return Err(QaError::DimensionMismatch {
                expected: self.dimension,
                actual: parsed.embedding.len(),
            });
        }

        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Ollama embeddings request
#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

/// Ollama embeddings response
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}
