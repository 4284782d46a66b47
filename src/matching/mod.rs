//! Fuzzy resolution of generator suggestions against catalog search results.

mod score;
mod text;

pub use score::{match_score, title_similarity, year_score};
pub use text::{normalize_language, normalize_title, suggestion_key};

use crate::models::{CatalogRecord, Suggestion};

pub const DEFAULT_MIN_SCORE: f64 = 0.55;

/// Highest-scoring candidate strictly above `min_score`. Ties keep the earlier
/// candidate, which is the provider's relevance order.
pub fn resolve_best<'a>(
    suggestion: &Suggestion,
    candidates: &'a [CatalogRecord],
    min_score: f64,
) -> Option<&'a CatalogRecord> {
    let mut best: Option<&CatalogRecord> = None;
    let mut best_score = min_score;
    for candidate in candidates {
        let score = match_score(suggestion, candidate);
        if score > best_score {
            best_score = score;
            best = Some(candidate);
        }
    }
    best
}

/// Keeps candidates whose original language is in `wanted`. If that would
/// leave nothing, the unfiltered pool comes back: a strong title/year match in
/// another language beats no match at all. An empty `wanted` is a no-op.
pub fn filter_by_language(candidates: Vec<CatalogRecord>, wanted: &[String]) -> Vec<CatalogRecord> {
    if wanted.is_empty() {
        return candidates;
    }
    let speaks = |c: &CatalogRecord| {
        let lang = normalize_language(&c.original_language);
        wanted.iter().any(|w| normalize_language(w) == lang)
    };
    if !candidates.iter().any(|c| speaks(c)) {
        return candidates;
    }
    candidates.into_iter().filter(|c| speaks(c)).collect()
}
