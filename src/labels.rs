const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Languages offered as deck filters.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("ko", "Korean"),
    ("ja", "Japanese"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("tr", "Turkish"),
];

// slug, label, movie genre ids, tv genre ids
const GENRES: &[(&str, &str, &[i32], &[i32])] = &[
    ("thriller", "Thriller", &[53], &[80, 9648]),
    ("comedy", "Comedy", &[35], &[35]),
    ("drama", "Drama", &[18], &[18]),
    ("romance", "Romance", &[10749], &[18, 10766]),
    ("action", "Action", &[28, 12], &[10759]),
    ("horror", "Horror", &[27], &[9648, 10765]),
    ("sci-fi", "Sci-Fi", &[878], &[10765]),
    ("crime", "Crime", &[80], &[80]),
    ("adventure", "Adventure", &[12], &[10759]),
    ("mystery", "Mystery", &[9648], &[9648]),
    ("fantasy", "Fantasy", &[14], &[10765]),
    ("animation", "Animation", &[16], &[16]),
    ("documentary", "Documentary", &[99], &[99]),
];

pub fn language_label(code: &str) -> Option<&'static str> {
    let code = code.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

/// Display label for a catalog genre id. Several ids share a label, and the
/// last entry that lists an id wins.
pub fn genre_label(id: i32) -> &'static str {
    GENRES
        .iter()
        .rev()
        .find(|(_, _, movie, tv)| movie.contains(&id) || tv.contains(&id))
        .map(|(_, label, _, _)| *label)
        .unwrap_or("Genre")
}

/// Labels for a record's genres, deduplicated, in id order.
pub fn genre_labels(ids: &[i32]) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for id in ids {
        let label = genre_label(*id);
        if !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

pub fn is_genre_slug(slug: &str) -> bool {
    GENRES.iter().any(|(s, _, _, _)| *s == slug)
}

pub fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{IMAGE_BASE}/{size}{path}"))
}
