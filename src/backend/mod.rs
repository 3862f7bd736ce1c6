//! Model backend seam
//!
//! The generation controller consumes tokens through the `ModelBackend`
//! trait; the shipped implementation streams from a local Ollama service.

pub mod ollama;
pub mod parser;
pub mod retry;

// Re-export commonly used types
pub use ollama::{OllamaBackend, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use parser::{StreamParser, MAX_BUFFER_SIZE};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

use crate::errors::Result;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// One fragment of the generated answer. `done` marks end-of-stream; the
/// final chunk may carry empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChunk {
    pub text: String,
    pub done: bool,
}

/// Lazy token sequence terminated by a chunk with `done = true`
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<TokenChunk>> + Send>>;

/// Streaming text-generation backend
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Submit a prompt and stream back token chunks in production order
    async fn generate_stream(&self, prompt: String) -> Result<TokenStream>;
}
