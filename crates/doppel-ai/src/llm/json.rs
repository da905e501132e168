//! Structured-output cleanup for model responses.

use serde_json::Value;

const FENCE: &str = "```";

/// Remove one optional fenced-block wrapper and a leading `json` tag.
///
/// Text between the first and second fence is kept; without a closing
/// fence everything after the opening one is kept.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    let inner = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.trim()
}

/// Strip a fence wrapper and parse the remainder as JSON.
pub fn parse_structured(content: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(content))
}
