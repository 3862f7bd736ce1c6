//! Hybrid retrieval engine
//!
//! Embeds the query, runs both indices against the same snapshot, fuses the
//! two rankings, and joins chunk metadata for citation rendering. A query
//! repeated against the same index generation is served from the cache.

use crate::embedding::EmbeddingProvider;
use crate::errors::{QaError, Result};
use crate::index::IndexRegistry;
use crate::retrieval::cache::{QueryCache, DEFAULT_CACHE_CAPACITY};
use crate::retrieval::fusion::fuse;
use crate::types::{RetrievalResult, RetrievedChunk};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum query length after sanitization
const MAX_QUERY_LENGTH: usize = 1000;

/// Retrieval tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Weight of the vector signal in [0, 1]
    pub alpha: f32,
    /// Result-count limit K
    pub top_k: usize,
    /// Cached query capacity
    pub cache_capacity: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            top_k: 5,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Trim, collapse internal whitespace, and cap query length
pub fn sanitize_query(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut sanitized = collapsed.trim().to_string();

    if sanitized.len() > MAX_QUERY_LENGTH {
        // Truncate on a char boundary
        let cut = (0..=MAX_QUERY_LENGTH)
            .rev()
            .find(|i| sanitized.is_char_boundary(*i))
            .unwrap_or(0);
        sanitized.truncate(cut);
    }

    sanitized
}

/// Hybrid retriever combining vector and keyword search
pub struct HybridRetriever {
    registry: Arc<IndexRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: QueryCache,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(registry: Arc<IndexRegistry>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(registry, embedder, RetrievalConfig::default())
    }

    pub fn with_config(
        registry: Arc<IndexRegistry>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            registry,
            embedder,
            cache: QueryCache::new(config.cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve the fused top-K context set for a query.
    ///
    /// One empty index degrades the query to the other signal instead of
    /// failing; both empty yields an empty result. Results are cached per
    /// (conversation, query, generation) and stale generations are purged
    /// once a rebuild is observed.
    pub async fn retrieve(
        &self,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<RetrievalResult> {
        let query = sanitize_query(query);
        if query.is_empty() {
            return Err(QaError::EmptyQuery);
        }

        let snapshot = self.registry.snapshot();
        let generation = snapshot.generation;
        self.cache.purge_stale(generation);

        if let Some(hits) = self.cache.get(conversation_id, &query, generation) {
            tracing::debug!(generation, "retrieval served from cache");
            return Ok(RetrievalResult { hits, generation });
        }

        if snapshot.vector.is_empty() && snapshot.keyword.is_empty() {
            tracing::warn!("both indices empty, returning no context");
            return Ok(RetrievalResult::empty(generation));
        }

        // Over-fetch per side so fusion has candidates beyond the final K
        let candidate_limit = self.config.top_k * 2;

        let query_vector = self.embedder.embed(&query).await?;
        let vector_results = snapshot.vector.search(&query_vector, candidate_limit)?;
        let keyword_results = snapshot.keyword.search(&query, candidate_limit);

        let alpha = effective_alpha(
            self.config.alpha,
            vector_results.is_empty(),
            keyword_results.is_empty(),
        );
        if alpha != self.config.alpha {
            tracing::warn!(
                configured = self.config.alpha,
                effective = alpha,
                "one retrieval signal unavailable, degrading to the other"
            );
        }

        let fused = fuse(&vector_results, &keyword_results, alpha, self.config.top_k);

        let hits: Vec<RetrievedChunk> = fused
            .into_iter()
            .filter_map(|scored| {
                let meta = snapshot.chunk_meta(&scored.chunk_id)?;
                Some(RetrievedChunk {
                    chunk_id: scored.chunk_id,
                    document_id: meta.document_id.clone(),
                    document_name: meta.document_name.clone(),
                    text: meta.text.clone(),
                    page: meta.page,
                    vector_score: scored.vector_score,
                    keyword_score: scored.keyword_score,
                    fused_score: scored.fused_score,
                })
            })
            .collect();

        if hits.is_empty() {
            tracing::warn!(query = %query, "no relevant documents found");
        } else {
            tracing::debug!(hits = hits.len(), generation, "retrieval complete");
        }

        self.cache
            .insert(conversation_id, &query, generation, hits.clone());

        Ok(RetrievalResult { hits, generation })
    }
}

/// Collapse alpha to a single signal when the other produced no candidates
fn effective_alpha(alpha: f32, vector_empty: bool, keyword_empty: bool) -> f32 {
    match (vector_empty, keyword_empty) {
        (true, false) => 0.0,
        (false, true) => 1.0,
        _ => alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_query("  how  do\nI   start "), "how do I start");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "word ".repeat(400);
        let sanitized = sanitize_query(&long);
        assert!(sanitized.len() <= MAX_QUERY_LENGTH);
    }

    #[test]
    fn test_effective_alpha_degradation() {
        assert_eq!(effective_alpha(0.7, true, false), 0.0);
        assert_eq!(effective_alpha(0.7, false, true), 1.0);
        assert_eq!(effective_alpha(0.7, false, false), 0.7);
        // Both empty never reaches fusion, but the value stays configured
        assert_eq!(effective_alpha(0.7, true, true), 0.7);
    }
}
