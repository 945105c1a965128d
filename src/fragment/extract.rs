//! JSON extraction from raw generator text
//!
//! Generators are asked for a bare JSON object but often wrap it in a fenced
//! code block or surround it with prose.

const FENCE: &str = "```";

/// Isolate the JSON payload inside `text`.
///
/// A fenced block wins (an optional `json` language tag is skipped). Otherwise
/// the span from the first `{` to the last `}` is returned, and failing that
/// the trimmed text itself.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(inner) = fenced_block(trimmed) {
        return inner;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];
    let body = match after_open.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &after_open[4..],
        _ => after_open,
    };
    let close = body.find(FENCE)?;
    Some(body[..close].trim())
}
