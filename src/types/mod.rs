//! Core data types shared across the retrieval and generation pipeline

use serde::{Deserialize, Serialize};

/// A bounded span of document text with its embedding, the atomic unit of
/// retrieval. Immutable once created; a document re-process replaces its
/// chunks wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: String,
    /// Owning document identifier
    pub document_id: String,
    /// Human-readable source document name
    pub document_name: String,
    /// Chunk text
    pub text: String,
    /// Page number within the source document (1-based)
    pub page: usize,
    /// Position of the chunk within the document (0-based)
    pub position: usize,
    /// Embedding vector of the configured dimension
    pub embedding: Vec<f32>,
}

/// Per-query scoring record for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk_id: String,
    /// Raw cosine similarity from the vector index (higher = better)
    pub vector_score: f32,
    /// Raw BM25 relevance from the keyword index (higher = better)
    pub keyword_score: f32,
    /// Weighted combination of the normalized scores
    pub fused_score: f32,
}

/// A scored chunk joined with the source text and metadata the prompt
/// composer needs for citation markers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub document_name: String,
    pub text: String,
    pub page: usize,
    pub vector_score: f32,
    pub keyword_score: f32,
    pub fused_score: f32,
}

impl RetrievedChunk {
    pub fn scores(&self) -> ScoredChunk {
        ScoredChunk {
            chunk_id: self.chunk_id.clone(),
            vector_score: self.vector_score,
            keyword_score: self.keyword_score,
            fused_score: self.fused_score,
        }
    }
}

/// Ordered, deduplicated retrieval output, bounded by the result limit.
/// Lives until the answer is produced, then only citation metadata survives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
    /// Index generation the hits were computed against
    pub generation: u64,
}

impl RetrievalResult {
    pub fn empty(generation: u64) -> Self {
        Self {
            hits: Vec::new(),
            generation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Marker linking part of a generated answer back to a source chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based marker number as rendered in the prompt (`[Source N]`)
    pub marker: usize,
    pub document: String,
    pub page: usize,
    pub chunk_id: String,
    /// Fused retrieval score of the cited chunk
    pub relevance: f32,
}

impl Citation {
    /// Build the citation list for a retrieval result, in marker order
    pub fn from_hits(hits: &[RetrievedChunk]) -> Vec<Citation> {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| Citation {
                marker: i + 1,
                document: hit.document_name.clone(),
                page: hit.page,
                chunk_id: hit.chunk_id.clone(),
                relevance: hit.fused_score,
            })
            .collect()
    }
}
