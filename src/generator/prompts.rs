use crate::labels::language_label;
use crate::models::{CatalogRecord, Constraints};

const MAX_OVERVIEW_CHARS: usize = 100;

fn render_record_line(record: &CatalogRecord) -> String {
    let year = record
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let summary = if record.overview.is_empty() {
        "No synopsis available.".to_string()
    } else {
        let head: String = record.overview.chars().take(MAX_OVERVIEW_CHARS).collect();
        format!("{head}...")
    };
    format!("- {} ({year}): {summary}", record.title)
}

fn render_languages(codes: &[String]) -> String {
    if codes.is_empty() {
        return "any".to_string();
    }
    codes
        .iter()
        .map(|code| match language_label(code) {
            Some(label) => format!("{label} ({code})"),
            None => code.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn deck_prompt(constraints: &Constraints, count: usize) -> String {
    let genres = if constraints.genres.is_empty() {
        "any".to_string()
    } else {
        constraints.genres.join(", ")
    };
    let vibe_line = constraints
        .vibe()
        .map(|v| format!("- Vibe/Mood: {v}\n"))
        .unwrap_or_default();

    format!(
        r#"You are a movie recommendation expert. Based on the user's preferences, suggest {count} diverse movies/series for them to swipe on.

User Preferences:
- Content Type: {content}
- Languages: {languages}
- Genres: {genres}
- Year Range: {years}
{vibe_line}
Requirements:
1. Return EXACTLY {count} suggestions
2. Make them DIVERSE - vary popularity (mix blockbusters with hidden gems), sub-genres, tones, and decades within the year range
3. All suggestions must be real, well-known movies/series
4. Respect the language filter strictly

Return ONLY a valid JSON array, no other text:
[
  {{"title": "Movie Name", "year": 2020, "originalLanguage": "en"}},
  ...
]"#,
        content = constraints.content_kind.as_str(),
        languages = render_languages(&constraints.language_set()),
        years = constraints.year_range.as_str(),
    )
}

pub fn final_pick_prompt(
    liked: &[CatalogRecord],
    disliked: &[CatalogRecord],
    excluded_titles: &[String],
) -> String {
    let section = |records: &[CatalogRecord]| {
        if records.is_empty() {
            "- None".to_string()
        } else {
            records
                .iter()
                .map(render_record_line)
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    let excluded = if excluded_titles.is_empty() {
        String::new()
    } else {
        let lines = excluded_titles
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\nDo not recommend any of these titles either:\n{lines}\n")
    };

    format!(
        r#"You are a movie recommendation expert. Analyze the user's swipe patterns and recommend ONE perfect movie/series for them.

Movies/Series they LIKED (swiped right):
{liked}

Movies/Series they DISLIKED (swiped left):
{disliked}
{excluded}
Analyze what patterns you see:
- What themes, tones, or elements appear in their likes?
- What are they avoiding based on dislikes?

Now recommend ONE movie/series that:
1. Is NOT in either list above
2. Matches the patterns from their likes
3. Avoids elements from their dislikes
4. Is a real, well-known title

Return ONLY valid JSON, no other text:
{{
  "title": "Movie Name",
  "year": 2020,
  "originalLanguage": "en",
  "reason": "One paragraph explaining why this is perfect for them based on their swipes"
}}"#,
        liked = section(liked),
        disliked = section(disliked),
    )
}
