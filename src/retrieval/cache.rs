//! Bounded query-result cache
//!
//! Keys include the index generation, so results computed against an old
//! snapshot become unreachable the moment a rebuild commits. `purge_stale`
//! drops those entries wholesale. Capacity is bounded with FIFO eviction.

use crate::types::RetrievedChunk;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default number of cached queries
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    conversation_id: Option<String>,
    query: String,
    generation: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Vec<RetrievedChunk>>,
    insertion_order: VecDeque<CacheKey>,
}

/// Query cache keyed by (conversation id, query text, index generation)
#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    pub fn get(
        &self,
        conversation_id: Option<&str>,
        query: &str,
        generation: u64,
    ) -> Option<Vec<RetrievedChunk>> {
        let key = CacheKey {
            conversation_id: conversation_id.map(str::to_string),
            query: query.to_string(),
            generation,
        };

        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.entries.get(&key).cloned()
    }

    pub fn insert(
        &self,
        conversation_id: Option<&str>,
        query: &str,
        generation: u64,
        hits: Vec<RetrievedChunk>,
    ) {
        if self.capacity == 0 {
            return;
        }

        let key = CacheKey {
            conversation_id: conversation_id.map(str::to_string),
            query: query.to_string(),
            generation,
        };

        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());

        if inner.entries.insert(key.clone(), hits).is_none() {
            inner.insertion_order.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Drop every entry computed against a generation older than `current`
    pub fn purge_stale(&self, current: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.entries.retain(|key, _| key.generation == current);
        let entries = std::mem::take(&mut inner.entries);
        inner
            .insertion_order
            .retain(|key| entries.contains_key(key));
        inner.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
