use crate::models::{CatalogRecord, Suggestion};

use super::text::normalize_title;

const TITLE_WEIGHT: f64 = 0.65;
const YEAR_WEIGHT: f64 = 0.25;
const LANGUAGE_WEIGHT: f64 = 0.10;

/// Weighted match score in `[0, 1]` between a suggestion and a catalog record.
pub fn match_score(suggestion: &Suggestion, candidate: &CatalogRecord) -> f64 {
    let title = title_similarity(&suggestion.title, &candidate.title);
    let year = year_score(suggestion.year, candidate.release_year());
    let language = language_score(&suggestion.original_language, &candidate.original_language);
    (TITLE_WEIGHT * title + YEAR_WEIGHT * year + LANGUAGE_WEIGHT * language).clamp(0.0, 1.0)
}

/// One minus the Levenshtein distance over the longer normalized length.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let left = normalize_title(a);
    let right = normalize_title(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }
    // Normalized titles are ASCII, so byte length is char length.
    let max_len = left.len().max(right.len());
    let distance = strsim::levenshtein(&left, &right);
    1.0 - distance as f64 / max_len as f64
}

pub fn year_score(suggested: i32, candidate: Option<i32>) -> f64 {
    let Some(candidate) = candidate else {
        return 0.0;
    };
    match (i64::from(candidate) - i64::from(suggested)).abs() {
        0 => 1.0,
        1 => 0.7,
        2 | 3 => 0.35,
        _ => 0.0,
    }
}

fn language_score(suggested: &str, candidate: &str) -> f64 {
    if suggested.trim().eq_ignore_ascii_case(candidate.trim()) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn record(title: &str, release_date: &str, language: &str) -> CatalogRecord {
        CatalogRecord {
            id: 1,
            media_kind: MediaKind::Movie,
            title: title.to_string(),
            original_title: title.to_string(),
            overview: String::new(),
            poster_ref: None,
            backdrop_ref: None,
            release_date: release_date.to_string(),
            vote_average: 7.0,
            vote_count: 100,
            genre_ids: vec![],
            original_language: language.to_string(),
        }
    }

    #[test]
    fn exact_match_scores_one() {
        let s = Suggestion::new("Inception", 2010, "en");
        let score = match_score(&s, &record("Inception", "2010-07-16", "EN"));
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn disjoint_titles_without_year_or_language_score_zero() {
        let s = Suggestion::new("abc", 1990, "fr");
        let score = match_score(&s, &record("xyz", "", "en"));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let s = Suggestion::new("The Lord of the Rings", 2001, "en");
        for (title, date, lang) in [
            ("Lord of the Rings", "2001-12-19", "en"),
            ("The Return of the King", "2003-12-17", "en"),
            ("", "1978-11-15", "en"),
            ("Rings", "garbage", "xx"),
        ] {
            let score = match_score(&s, &record(title, date, lang));
            assert!((0.0..=1.0).contains(&score), "{title}: {score}");
        }
    }

    #[test]
    fn year_score_steps_down_with_distance() {
        assert_eq!(year_score(2010, Some(2010)), 1.0);
        assert_eq!(year_score(2010, Some(2009)), 0.7);
        assert_eq!(year_score(2010, Some(2012)), 0.35);
        assert_eq!(year_score(2010, Some(2013)), 0.35);
        assert_eq!(year_score(2010, Some(2014)), 0.0);
        assert_eq!(year_score(2010, None), 0.0);
    }

    #[test]
    fn title_similarity_uses_edit_distance() {
        assert_eq!(title_similarity("", "Heat"), 0.0);
        assert_eq!(title_similarity("Heat!", "heat"), 1.0);
        // "kitten" -> "sitting" is three edits over seven characters.
        let sim = title_similarity("kitten", "sitting");
        assert!((sim - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }
}
