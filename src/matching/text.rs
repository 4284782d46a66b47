/// Canonical form of a title for comparison: lowercase ASCII letters, digits
/// and single spaces. Apostrophes vanish so "Schindler's" matches "Schindlers".
pub fn normalize_title(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        if matches!(ch, '\'' | '\u{2018}' | '\u{2019}') {
            continue;
        }
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Lowercased, trimmed language code.
pub fn normalize_language(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Dedupe key for suggestions within one build.
pub fn suggestion_key(title: &str, year: i32, language: &str) -> (String, i32, String) {
    (normalize_title(title), year, normalize_language(language))
}
