//! In-memory vector index with cosine similarity search
//!
//! Entries live in a `BTreeMap` keyed by chunk id so iteration order is
//! stable and similarity ties always break the same way.

use crate::errors::{QaError, Result};
use std::collections::BTreeMap;

/// Vector index over fixed-dimension embeddings
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Embedding dimension every entry must match
    dimension: usize,
    /// chunk id -> embedding
    entries: BTreeMap<String, Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index for the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: BTreeMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.entries.contains_key(chunk_id)
    }

    /// Insert or replace an entry, rejecting wrong-dimension vectors
    pub fn upsert(&mut self, chunk_id: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(QaError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        self.entries.insert(chunk_id.to_string(), vector);
        Ok(())
    }

    /// Remove an entry; removing a missing id is a no-op
    pub fn remove(&mut self, chunk_id: &str) {
        self.entries.remove(chunk_id);
    }

    /// Nearest-neighbor search by cosine similarity.
    ///
    /// Returns at most `limit` entries sorted by descending similarity,
    /// ties broken by ascending chunk id. An empty index returns an empty
    /// list, never an error.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimension {
            return Err(QaError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if self.entries.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(String, f32)> = self
            .entries
            .iter()
            .map(|(id, vector)| (id.clone(), cosine_similarity(query, vector)))
            .collect();

        // BTreeMap iteration already yields ascending ids, and the sort is
        // stable, so equal similarities keep ascending-id order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }
}

/// Cosine similarity of two equal-length vectors; zero-magnitude input
/// scores 0.0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
