//! Hybrid retrieval
//!
//! Fusion ranking over the vector and keyword indices, with a
//! generation-keyed query cache.

pub mod cache;
pub mod engine;
pub mod fusion;

// Re-export commonly used types
pub use cache::{QueryCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{sanitize_query, HybridRetriever, RetrievalConfig};
pub use fusion::fuse;
