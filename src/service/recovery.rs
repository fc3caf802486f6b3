// Response recovery
//
// Model output is untyped text: prose, markdown-fenced JSON, or malformed
// JSON. This module extracts structured data from it. Recovery failure is a
// value (`None`), never an error, so callers are forced through the
// fallback path instead of propagating an exception.

use serde_json::Value;

/// Extract a JSON value from raw model text.
///
/// Strips a single leading ```json or ``` fence (plus the trailing fence
/// when present) before parsing. Deeper malformations (trailing commas,
/// unescaped quotes) are not repaired; those return `None` and count as a
/// recovery failure.
pub fn parse_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        strip_trailing_fence(rest)
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        strip_trailing_fence(rest)
    } else {
        trimmed
    };

    serde_json::from_str(body.trim()).ok()
}

fn strip_trailing_fence(body: &str) -> &str {
    body.trim().strip_suffix("```").unwrap_or(body)
}
