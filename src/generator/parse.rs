use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use tracing::debug;

use crate::models::{PickSuggestion, Suggestion};

/// Drops a surrounding Markdown code fence, with or without a `json` tag.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Slice from the first `{` or `[` to the last matching closer. Text with no
/// opener is returned as-is and left for the JSON parser to reject.
fn extract_json_payload(raw: &str) -> &str {
    let cleaned = strip_code_fences(raw);
    let start = match (cleaned.find('{'), cleaned.find('[')) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return cleaned,
    };
    let closer = if cleaned.as_bytes()[start] == b'[' { ']' } else { '}' };
    match cleaned.rfind(closer) {
        Some(end) if end > start => &cleaned[start..=end],
        _ => &cleaned[start..],
    }
}

pub fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(extract_json_payload(raw))
        .map_err(|_| anyhow!("Generator returned invalid JSON"))
}

/// Strict parse of a suggestion array: malformed items are dropped, and the
/// survivors must number exactly `expected`.
pub fn parse_suggestions(raw: &str, expected: usize) -> Result<Vec<Suggestion>> {
    let value = parse_json(raw)?;
    let Value::Array(items) = value else {
        bail!("Generator suggestions response is not an array");
    };
    let suggestions: Vec<Suggestion> = items
        .iter()
        .filter_map(|item| match Suggestion::from_value(item) {
            Ok(s) => Some(s),
            Err(e) => {
                debug!(error = %e, "Dropping malformed suggestion");
                None
            }
        })
        .collect();
    if suggestions.len() != expected {
        bail!(
            "Generator returned {} suggestions, expected {}",
            suggestions.len(),
            expected
        );
    }
    Ok(suggestions)
}

/// The final pick has no meaningful partial form, so any defect fails it.
pub fn parse_pick(raw: &str) -> Result<PickSuggestion> {
    let value = parse_json(raw)?;
    PickSuggestion::from_value(&value)
        .map_err(|e| anyhow!("Generator final pick is invalid: {e}"))
}
