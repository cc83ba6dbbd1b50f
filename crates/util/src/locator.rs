//! Dotted-path resolution over JSON values.
//!
//! Locators configured as strings (`"data.items"`, `"rows[0].name"`) are
//! resolved by sequential property lookup, short-circuiting to `None` on any
//! missing intermediate rather than erroring.

use serde_json::Value;

/// Resolve a dotted path against a JSON value.
///
/// Empty segments are skipped, so `"a..b"` and `".a.b"` behave like `"a.b"`.
/// Bracketed numeric indices (`items[2]`) step into arrays. An empty or
/// whitespace-only path resolves to the value itself.
///
/// # Example
/// ```
/// use serde_json::json;
/// use typeahead_util::locator::resolve_path;
///
/// let value = json!({"data": {"items": [{"name": "a"}]}});
/// assert_eq!(resolve_path(&value, "data.items[0].name"), Some(json!("a")));
/// assert_eq!(resolve_path(&value, "data.missing.name"), None);
/// ```
pub fn resolve_path(value: &Value, path: &str) -> Option<Value> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for segment in trimmed.split('.') {
        if segment.is_empty() {
            continue;
        }
        let (key, indices) = split_indices(segment);
        if !key.is_empty() {
            current = current.get(key)?;
        }
        for index in indices {
            current = current.get(index)?;
        }
    }
    Some(current.clone())
}

/// Split a path segment into its key part and any trailing `[n]` indices.
fn split_indices(segment: &str) -> (&str, Vec<usize>) {
    let mut key_end = segment.len();
    let bytes = segment.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'[' {
            key_end = i;
            break;
        }
    }

    let key = &segment[..key_end];
    let mut indices = Vec::new();
    let mut rest = &segment[key_end..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        if let Ok(index) = stripped[..close].parse::<usize>() {
            indices.push(index);
        }
        rest = &stripped[close + 1..];
    }
    (key, indices)
}

/// Plain-text form of a scalar JSON value.
///
/// Strings pass through unquoted; composites fall back to compact JSON so a
/// missing text locator still yields something filterable.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
