//! JSON-recovery parsing for structured-output responses.
//!
//! Models asked for "only JSON" routinely wrap it in a code fence, prefix it
//! with a label, or double-encode it as a JSON string. Rather than failing
//! the call on the first parse error, a handful of cheap, ordered recovery
//! strategies are tried before giving up.

use serde_json::Value;

use crate::error::{Result, ScryError};

/// Parses `text` as JSON, trying a sequence of increasingly aggressive
/// recovery strategies before returning a [`ScryError::Model`].
pub fn parse_json_with_recovery(text: &str) -> Result<Value> {
    for candidate in build_json_candidates(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            return Ok(value);
        }
    }
    Err(ScryError::Model(format!(
        "could not parse model output as JSON after recovery attempts: {text}"
    )))
}

/// Builds an ordered, deduplicated list of text candidates to try parsing.
fn build_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut push = |s: String| {
        let trimmed = s.trim().to_string();
        if !trimmed.is_empty() && !candidates.contains(&trimmed) {
            candidates.push(trimmed);
        }
    };

    push(text.to_string());

    let fenced = strip_code_fences(text);
    push(fenced.clone());

    if let Some(block) = extract_json_block(&fenced) {
        push(block);
    }
    if let Some(block) = extract_json_block(text) {
        push(block);
    }

    if let Some(dequoted) = dequote_json_string(text) {
        push(dequoted);
    }

    push(strip_leading_label(&fenced));
    push(strip_leading_label(text));

    candidates
}

/// Strips a leading/trailing ```` ```json ```` or ```` ``` ```` fence, if present.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix("JSON").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\n', '\r']);
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}

/// Extracts the first top-level `{...}` or `[...]` block, scanning for the
/// first opening bracket and its matching close, whichever starts first.
fn extract_json_block(text: &str) -> Option<String> {
    let obj_start = text.find('{');
    let arr_start = text.find('[');

    let (start, open, close) = match (obj_start, arr_start) {
        (Some(o), Some(a)) if a < o => (a, '[', ']'),
        (Some(o), _) => (o, '{', '}'),
        (None, Some(a)) => (a, '[', ']'),
        (None, None) => return None,
    };

    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        let c = b as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// If `text` is itself a JSON string literal containing escaped JSON,
/// un-escapes it one layer.
fn dequote_json_string(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() > 1) {
        return None;
    }
    serde_json::from_str::<String>(trimmed).ok()
}

/// Strips a leading bare label like `json` or `JSON:` before the payload.
fn strip_leading_label(text: &str) -> String {
    let trimmed = text.trim();
    for label in ["json:", "json", "JSON:", "JSON"] {
        if let Some(rest) = trimmed.strip_prefix(label) {
            let rest = rest.trim();
            if rest.starts_with('{') || rest.starts_with('[') {
                return rest.to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let v = parse_json_with_recovery(r#"{"a":1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_code_fence_json() {
        let v = parse_json_with_recovery("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_embedded_block() {
        let v = parse_json_with_recovery("here is the result: {\"a\":1} thanks").unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_quoted_json_string() {
        let quoted = serde_json::to_string(r#"{"a":1}"#).unwrap();
        let v = parse_json_with_recovery(&quoted).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_labeled_json() {
        let v = parse_json_with_recovery("json\n{\"a\":1}").unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn parses_embedded_array() {
        let v = parse_json_with_recovery("sure: [1,2,3] done").unwrap();
        assert_eq!(v, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn fails_on_unrecoverable_garbage() {
        assert!(parse_json_with_recovery("not json at all").is_err());
    }
}
