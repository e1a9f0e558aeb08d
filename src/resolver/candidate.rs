//! Media URL extraction from scraper-style lookup responses.
//!
//! Lookup services disagree on shape: the payload may be wrapped in `result`
//! once or twice, and the media field may be a string, a list of mirrors, or an
//! object keyed by variant. The rules below are applied in a fixed order over a
//! generic JSON value.

use serde_json::Value;

/// Fields checked, in order, on the unwrapped payload.
pub const CANDIDATE_FIELDS: [&str; 5] = ["video_url", "url", "video", "downloadUrl", "link"];

/// Variant keys preferred inside an object value: unwatermarked first, then
/// quality, then the watermarked copy.
pub const PREFERRED_VARIANTS: [&str; 4] = ["nowm", "hd", "sd", "wm"];

/// Levels of `result` wrapping that are looked through.
const MAX_RESULT_WRAPPING: usize = 2;

/// Nesting allowed below a candidate field.
const MAX_VALUE_DEPTH: usize = 4;

/// Looks through at most two non-null `result` wrappers.
#[must_use]
pub fn unwrap_result(value: &Value) -> &Value {
    let mut current = value;
    for _ in 0..MAX_RESULT_WRAPPING {
        match current.get("result") {
            Some(inner) if !inner.is_null() => current = inner,
            _ => break,
        }
    }
    current
}

/// Picks the media URL from a lookup response.
///
/// On an object payload the first of [`CANDIDATE_FIELDS`] yielding a
/// non-empty string wins. A bare string or array payload is read as a value.
/// Values are read as:
///
/// - string: itself
/// - array: its first element
/// - object: [`PREFERRED_VARIANTS`] in order, then the first key in the
///   object's own order
///
/// # Example
///
/// ```
/// use mediagrab_core::resolver::extract_candidate;
/// use serde_json::json;
///
/// let body = json!({"result": {"result": {"video": {"nowm": "A", "hd": "B"}}}});
/// assert_eq!(extract_candidate(&body).as_deref(), Some("A"));
/// ```
#[must_use]
pub fn extract_candidate(value: &Value) -> Option<String> {
    let payload = unwrap_result(value);
    match payload.as_object() {
        Some(fields) => CANDIDATE_FIELDS
            .iter()
            .filter_map(|name| fields.get(*name))
            .find_map(|field| candidate_from(field, 0)),
        None => candidate_from(payload, 0),
    }
}

fn candidate_from(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_VALUE_DEPTH {
        return None;
    }
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Array(items) => items.first().and_then(|first| candidate_from(first, depth + 1)),
        Value::Object(variants) => PREFERRED_VARIANTS
            .iter()
            .filter_map(|key| variants.get(*key))
            .chain(variants.values().take(1))
            .find_map(|variant| candidate_from(variant, depth + 1)),
        _ => None,
    }
}
