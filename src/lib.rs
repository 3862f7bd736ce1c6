//! askdocs - Hybrid Retrieval and Streaming Answer Pipeline
//!
//! Answers natural-language questions over a private document collection:
//! vector and keyword search fused into one ranked context set, a rule-based
//! prompt selector, and a streaming generation controller with cancellation,
//! timeout, and conversation continuity over local Ollama models.
//!
//! File parsing, embedding models, persistent storage engines, and the
//! HTTP/CLI surface are external collaborators consumed through the traits
//! in [`embedding`], [`backend`], and [`conversation`].

pub mod errors;
pub mod types;
pub mod config;
pub mod telemetry;

// Retrieval subsystem
pub mod embedding;
pub mod index;
pub mod retrieval;

// Prompt subsystem
pub mod classify;
pub mod prompts;

// Generation subsystem
pub mod backend;
pub mod conversation;
pub mod generation;

// Re-export commonly used types
pub use errors::{QaError, Result};
pub use generation::{GenerationController, StreamEvent, StreamingAnswer};
pub use types::{Chunk, Citation, RetrievalResult, RetrievedChunk, ScoredChunk};
