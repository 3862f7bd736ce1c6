//! In-memory keyword index with BM25 scoring
//!
//! The same tokenizer runs at indexing and query time: lowercase, split on
//! non-alphanumeric, drop stop words and tokens shorter than three chars.
//! Scores are therefore reproducible for identical inputs.

use std::collections::{BTreeMap, HashMap};

/// BM25 term-frequency saturation parameter
const BM25_K1: f32 = 1.2;

/// BM25 length-normalization parameter
const BM25_B: f32 = 0.75;

/// Stop words excluded from both postings and queries
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "because", "as", "what", "when", "where", "how",
    "why", "which", "who", "whom", "this", "that", "these", "those", "is", "are", "was", "were",
    "be", "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "i",
    "you", "he", "she", "it", "we", "they", "their", "his", "her", "its", "our", "your", "my",
    "of", "to", "in", "on", "at", "for", "with", "about",
];

/// Tokenize text for indexing or querying.
///
/// Lowercases, splits on anything non-alphanumeric, and drops stop words
/// and tokens shorter than three characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2 && !STOP_WORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

/// Per-chunk posting data
#[derive(Debug, Clone)]
struct Posting {
    /// term -> occurrence count within the chunk
    term_frequencies: HashMap<String, usize>,
    /// Token count after filtering
    length: usize,
}

/// Keyword index over tokenized chunk text
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    /// chunk id -> posting, BTreeMap for deterministic iteration
    postings: BTreeMap<String, Posting>,
    /// term -> number of chunks containing it
    document_frequencies: HashMap<String, usize>,
    /// Sum of posting lengths, maintained incrementally
    total_length: usize,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.postings.contains_key(chunk_id)
    }

    /// Index or re-index a chunk's text
    pub fn upsert(&mut self, chunk_id: &str, text: &str) {
        self.remove(chunk_id);

        let tokens = tokenize(text);
        let length = tokens.len();

        let mut term_frequencies: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            *term_frequencies.entry(token).or_insert(0) += 1;
        }

        for term in term_frequencies.keys() {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }

        self.total_length += length;
        self.postings.insert(
            chunk_id.to_string(),
            Posting {
                term_frequencies,
                length,
            },
        );
    }

    /// Remove a chunk's posting; removing a missing id is a no-op
    pub fn remove(&mut self, chunk_id: &str) {
        if let Some(posting) = self.postings.remove(chunk_id) {
            self.total_length -= posting.length;

            for term in posting.term_frequencies.keys() {
                if let Some(df) = self.document_frequencies.get_mut(term) {
                    *df -= 1;
                    if *df == 0 {
                        self.document_frequencies.remove(term);
                    }
                }
            }
        }
    }

    /// Term-relevance search.
    ///
    /// Returns at most `limit` entries with a positive BM25 score, sorted by
    /// descending relevance, ties broken by ascending chunk id. An empty
    /// index or a query with no indexable tokens returns an empty list.
    pub fn search(&self, query_text: &str, limit: usize) -> Vec<(String, f32)> {
        if self.postings.is_empty() || limit == 0 {
            return Vec::new();
        }

        let query_terms = tokenize(query_text);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let n = self.postings.len() as f32;
        let avg_length = self.total_length as f32 / n;

        let mut scored: Vec<(String, f32)> = self
            .postings
            .iter()
            .filter_map(|(id, posting)| {
                let score = self.bm25(posting, &query_terms, n, avg_length);
                (score > 0.0).then(|| (id.clone(), score))
            })
            .collect();

        // Ascending-id iteration plus a stable sort keeps ties deterministic.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    fn bm25(&self, posting: &Posting, query_terms: &[String], n: f32, avg_length: f32) -> f32 {
        let length_norm = 1.0 - BM25_B + BM25_B * (posting.length as f32 / avg_length.max(1.0));

        query_terms
            .iter()
            .map(|term| {
                let tf = *posting.term_frequencies.get(term).unwrap_or(&0) as f32;
                if tf == 0.0 {
                    return 0.0;
                }

                let df = *self.document_frequencies.get(term).unwrap_or(&0) as f32;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

                idf * (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1 * length_norm)
            })
            .sum()
    }
}
