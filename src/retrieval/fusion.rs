//! Weighted fusion of vector and keyword result lists
//!
//! Each raw score list is min-max normalized independently, the candidate
//! union is scored as `alpha * vector + (1 - alpha) * keyword`, and ties
//! break first by higher raw vector score, then by ascending chunk id.
//! Deduplication falls out of the union step.

use crate::types::ScoredChunk;
use std::collections::HashMap;

/// Min-max scale scores to [0, 1] over the candidates present in one list.
/// A single candidate, or a list with zero spread, normalizes to 1.0.
fn normalize(results: &[(String, f32)]) -> HashMap<&str, f32> {
    if results.is_empty() {
        return HashMap::new();
    }

    let min = results.iter().map(|(_, s)| *s).fold(f32::INFINITY, f32::min);
    let max = results
        .iter()
        .map(|(_, s)| *s)
        .fold(f32::NEG_INFINITY, f32::max);
    let spread = max - min;

    results
        .iter()
        .map(|(id, score)| {
            let normalized = if spread > 0.0 {
                (score - min) / spread
            } else {
                1.0
            };
            (id.as_str(), normalized)
        })
        .collect()
}

/// Merge two ranked lists into one fused, deduplicated ranking bounded by
/// `limit`. `alpha` in [0, 1] weights the vector signal; `alpha = 1.0`
/// reproduces the vector ordering and `alpha = 0.0` the keyword ordering.
pub fn fuse(
    vector_results: &[(String, f32)],
    keyword_results: &[(String, f32)],
    alpha: f32,
    limit: usize,
) -> Vec<ScoredChunk> {
    let alpha = alpha.clamp(0.0, 1.0);

    let norm_vector = normalize(vector_results);
    let norm_keyword = normalize(keyword_results);

    let raw_vector: HashMap<&str, f32> = vector_results
        .iter()
        .map(|(id, s)| (id.as_str(), *s))
        .collect();
    let raw_keyword: HashMap<&str, f32> = keyword_results
        .iter()
        .map(|(id, s)| (id.as_str(), *s))
        .collect();

    // Union of candidates; a chunk scored by both signals appears once.
    let mut ids: Vec<&str> = raw_vector.keys().chain(raw_keyword.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    let mut fused: Vec<ScoredChunk> = ids
        .into_iter()
        .map(|id| {
            let nv = norm_vector.get(id).copied().unwrap_or(0.0);
            let nk = norm_keyword.get(id).copied().unwrap_or(0.0);

            ScoredChunk {
                chunk_id: id.to_string(),
                vector_score: raw_vector.get(id).copied().unwrap_or(0.0),
                keyword_score: raw_keyword.get(id).copied().unwrap_or(0.0),
                fused_score: alpha * nv + (1.0 - alpha) * nk,
            }
        })
        .collect();

    // Candidates enter the sort in ascending-id order, so the final
    // tie-break is already in place before the stable sorts run.
    fused.sort_by(|a, b| {
        b.vector_score
            .partial_cmp(&a.vector_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    fused.truncate(limit);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn list(entries: &[(&str, f32)]) -> Vec<(String, f32)> {
        entries
            .iter()
            .map(|(id, s)| (id.to_string(), *s))
            .collect()
    }

    fn ids(results: &[ScoredChunk]) -> Vec<&str> {
        results.iter().map(|c| c.chunk_id.as_str()).collect()
    }

    #[test]
    fn test_alpha_one_reproduces_vector_order() {
        let vector = list(&[("a", 0.9), ("b", 0.7), ("c", 0.4)]);
        let keyword = list(&[("c", 9.0), ("b", 3.0)]);

        let results = fuse(&vector, &keyword, 1.0, 3);
        assert_eq!(ids(&results), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_alpha_zero_reproduces_keyword_order() {
        let vector = list(&[("a", 0.9), ("b", 0.7)]);
        let keyword = list(&[("c", 9.0), ("b", 3.0), ("a", 1.0)]);

        let results = fuse(&vector, &keyword, 0.0, 3);
        assert_eq!(ids(&results), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_spec_tie_scenario() {
        // A: vector 0.9 / keyword 0.2, B: vector 0.3 / keyword 0.95.
        // Normalized: A = (1.0, 0.0), B = (0.0, 1.0). Fused at alpha 0.5
        // both 0.5; the higher raw vector score puts A first.
        let vector = list(&[("A", 0.9), ("B", 0.3)]);
        let keyword = list(&[("B", 0.95), ("A", 0.2)]);

        let results = fuse(&vector, &keyword, 0.5, 2);
        assert_eq!(ids(&results), vec!["A", "B"]);
        assert!((results[0].fused_score - 0.5).abs() < 1e-6);
        assert!((results[1].fused_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_equal_everything_ties_break_by_chunk_id() {
        let vector = list(&[("zeta", 0.5), ("alpha", 0.5)]);
        let keyword = list(&[]);

        let results = fuse(&vector, &keyword, 1.0, 2);
        assert_eq!(ids(&results), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_single_candidate_normalizes_to_one() {
        let vector = list(&[("only", 0.01)]);
        let results = fuse(&vector, &[], 1.0, 5);

        assert_eq!(results.len(), 1);
        assert!((results[0].fused_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_spread_normalizes_to_one() {
        let vector = list(&[("a", 0.4), ("b", 0.4)]);
        let keyword = list(&[("b", 2.0), ("c", 1.0)]);

        let results = fuse(&vector, &keyword, 0.5, 3);
        // b: 0.5 * 1.0 + 0.5 * 1.0 = 1.0 beats a (0.5) and c (0.0 keyword min)
        assert_eq!(results[0].chunk_id, "b");
        assert!((results[0].fused_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_chunk_in_both_lists_appears_once() {
        let vector = list(&[("shared", 0.8), ("v", 0.5)]);
        let keyword = list(&[("shared", 4.0), ("k", 2.0)]);

        let results = fuse(&vector, &keyword, 0.5, 10);
        let shared_count = results.iter().filter(|c| c.chunk_id == "shared").count();
        assert_eq!(shared_count, 1);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_raw_scores_carried_through() {
        let vector = list(&[("a", 0.8)]);
        let keyword = list(&[("a", 3.5)]);

        let results = fuse(&vector, &keyword, 0.5, 1);
        assert!((results[0].vector_score - 0.8).abs() < 1e-6);
        assert!((results[0].keyword_score - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_side_scores_zero() {
        let vector = list(&[("v_only", 0.9)]);
        let keyword = list(&[("k_only", 5.0)]);

        let results = fuse(&vector, &keyword, 0.5, 2);
        let v_only = results.iter().find(|c| c.chunk_id == "v_only").unwrap();
        let k_only = results.iter().find(|c| c.chunk_id == "k_only").unwrap();

        assert_eq!(v_only.keyword_score, 0.0);
        assert_eq!(k_only.vector_score, 0.0);
    }

    #[test]
    fn test_empty_inputs_empty_output() {
        assert!(fuse(&[], &[], 0.5, 10).is_empty());
    }

    #[quickcheck]
    fn prop_no_duplicates_and_bounded(
        vector: Vec<(u8, u16)>,
        keyword: Vec<(u8, u16)>,
        limit: u8,
    ) -> bool {
        let vector: Vec<(String, f32)> = vector
            .into_iter()
            .map(|(id, s)| (format!("c{id}"), s as f32))
            .collect();
        let keyword: Vec<(String, f32)> = keyword
            .into_iter()
            .map(|(id, s)| (format!("c{id}"), s as f32))
            .collect();

        let results = fuse(&vector, &keyword, 0.5, limit as usize);

        let mut seen = std::collections::HashSet::new();
        let unique = results.iter().all(|c| seen.insert(c.chunk_id.clone()));

        let mut union: Vec<&str> = vector
            .iter()
            .chain(keyword.iter())
            .map(|(id, _)| id.as_str())
            .collect();
        union.sort_unstable();
        union.dedup();

        unique && results.len() <= limit as usize && results.len() <= union.len()
    }

    #[quickcheck]
    fn prop_fused_scores_in_unit_interval(vector: Vec<(u8, u16)>, keyword: Vec<(u8, u16)>) -> bool {
        let vector: Vec<(String, f32)> = vector
            .into_iter()
            .map(|(id, s)| (format!("c{id}"), s as f32))
            .collect();
        let keyword: Vec<(String, f32)> = keyword
            .into_iter()
            .map(|(id, s)| (format!("c{id}"), s as f32))
            .collect();

        fuse(&vector, &keyword, 0.3, 64)
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.fused_score))
    }
}
