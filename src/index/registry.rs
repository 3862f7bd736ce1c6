//! Copy-on-rebuild index snapshots
//!
//! Both indices are rebuilt, never mutated in place, when documents change.
//! A rebuild constructs the complete new snapshot off-lock and swaps it in
//! a single write, so a reader either sees the previous consistent snapshot
//! or the new one, never a torn view. In-flight readers keep their `Arc`
//! alive until they finish.

use crate::errors::Result;
use crate::index::keyword::KeywordIndex;
use crate::index::vector::VectorIndex;
use crate::types::Chunk;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Chunk metadata retained alongside the indices so retrieval can resolve
/// text and citation fields without a repository round-trip
#[derive(Debug, Clone)]
pub struct ChunkMeta {
    pub document_id: String,
    pub document_name: String,
    pub text: String,
    pub page: usize,
}

/// One immutable generation of both indices
#[derive(Debug)]
pub struct IndexSnapshot {
    pub generation: u64,
    pub vector: VectorIndex,
    pub keyword: KeywordIndex,
    chunks: HashMap<String, ChunkMeta>,
}

impl IndexSnapshot {
    fn empty(dimension: usize) -> Self {
        Self {
            generation: 0,
            vector: VectorIndex::new(dimension),
            keyword: KeywordIndex::new(),
            chunks: HashMap::new(),
        }
    }

    pub fn chunk_meta(&self, chunk_id: &str) -> Option<&ChunkMeta> {
        self.chunks.get(chunk_id)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Shared handle to the current index snapshot
pub struct IndexRegistry {
    current: RwLock<Arc<IndexSnapshot>>,
    generation: AtomicU64,
    dimension: usize,
}

impl IndexRegistry {
    /// Create a registry with an empty generation-0 snapshot
    pub fn new(dimension: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(IndexSnapshot::empty(dimension))),
            generation: AtomicU64::new(0),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Current generation number; advances on every committed rebuild
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Clone the current snapshot handle. The snapshot stays valid for the
    /// caller even if a rebuild commits while it is in use.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild both indices from the full chunk set and commit atomically.
    ///
    /// A dimension mismatch in any chunk fails the whole rebuild and leaves
    /// the previous snapshot in place. Returns the new generation number.
    pub fn rebuild(&self, chunks: &[Chunk]) -> Result<u64> {
        let next_generation = self.generation.load(Ordering::Acquire) + 1;

        let mut vector = VectorIndex::new(self.dimension);
        let mut keyword = KeywordIndex::new();
        let mut meta = HashMap::with_capacity(chunks.len());

        for chunk in chunks {
            vector.upsert(&chunk.id, chunk.embedding.clone())?;
            keyword.upsert(&chunk.id, &chunk.text);
            meta.insert(
                chunk.id.clone(),
                ChunkMeta {
                    document_id: chunk.document_id.clone(),
                    document_name: chunk.document_name.clone(),
                    text: chunk.text.clone(),
                    page: chunk.page,
                },
            );
        }

        let snapshot = Arc::new(IndexSnapshot {
            generation: next_generation,
            vector,
            keyword,
            chunks: meta,
        });

        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *current = snapshot;
        }
        self.generation.store(next_generation, Ordering::Release);

        tracing::info!(
            generation = next_generation,
            chunks = chunks.len(),
            "index rebuild committed"
        );

        Ok(next_generation)
    }
}
