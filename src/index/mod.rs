//! Retrieval indices
//!
//! In-memory vector and keyword indices plus the snapshot registry that
//! rebuilds them atomically.

pub mod keyword;
pub mod registry;
pub mod vector;

// Re-export commonly used types
pub use keyword::{tokenize, KeywordIndex};
pub use registry::{ChunkMeta, IndexRegistry, IndexSnapshot};
pub use vector::VectorIndex;
