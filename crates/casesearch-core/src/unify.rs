//! Ordering contract shared by every result source.
//!
//! Both the local scorer and the remote index hand back `SearchResult`s; the
//! pipeline only publishes lists that went through [`unify`], so presentation
//! can rely on rank-descending order regardless of where the hits came from.

use crate::types::SearchResult;

/// Stable sort by rank descending. Equal ranks keep their incoming order.
pub fn sort_by_rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.rank().total_cmp(&a.rank()));
}

/// Clamp ranks to the non-negative range, sort and cap to `max_results`.
pub fn unify(mut results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    for r in &mut results {
        let rank = r.rank_mut();
        if rank.is_nan() || *rank < 0.0 { *rank = 0.0; }
    }
    sort_by_rank(&mut results);
    results.truncate(max_results);
    results
}
