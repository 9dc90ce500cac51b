//! JSON extraction from chat-model replies
//!
//! Models wrap JSON in markdown fences and surround it with prose. These
//! helpers cut out the first balanced JSON value of the expected kind.

use crate::types::AgentError;
use serde_json::Value;

/// Remove a surrounding markdown code fence (```json ... ```), if any
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = match rest.rfind("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    rest.trim()
}

/// Slice from `start` (an opening bracket) to its matching close
///
/// Brackets inside string literals are ignored.
fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the reply as a JSON array
///
/// An empty reply is an empty array. A reply whose first JSON value is an
/// object is rejected even if an array is nested inside it.
pub fn extract_json_array(text: &str) -> Result<Vec<Value>, AgentError> {
    let text = strip_code_fence(text);
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let start = text
        .find(['[', '{'])
        .ok_or_else(|| AgentError::Parse("no JSON array in response".to_string()))?;
    if text[start..].starts_with('{') {
        return Err(AgentError::Parse(
            "expected a JSON array, found an object".to_string(),
        ));
    }

    let span = balanced_span(text, start)
        .ok_or_else(|| AgentError::Parse("unbalanced brackets".to_string()))?;
    serde_json::from_str(span).map_err(|e| AgentError::Parse(e.to_string()))
}

/// Parse the first JSON object in the reply
pub fn extract_json_object(text: &str) -> Result<Value, AgentError> {
    let text = strip_code_fence(text);
    let start = text
        .find('{')
        .ok_or_else(|| AgentError::Parse("no JSON object in response".to_string()))?;
    let span = balanced_span(text, start)
        .ok_or_else(|| AgentError::Parse("unbalanced braces".to_string()))?;
    serde_json::from_str(span).map_err(|e| AgentError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fence_variants() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  [3]  "), "[3]");
        assert_eq!(strip_code_fence("```json\n[4]"), "[4]");
    }

    #[test]
    fn test_array_with_surrounding_prose() {
        let rows = extract_json_array("Here you go:\n[{\"price\": 1}, {\"price\": 2}]\nEnjoy").unwrap();
        assert_eq!(rows, vec![json!({"price": 1}), json!({"price": 2})]);
    }

    #[test]
    fn test_brackets_inside_strings() {
        let rows = extract_json_array(r#"[{"color": "grey ] [", "note": "say \"hi\""}]"#).unwrap();
        assert_eq!(rows[0]["color"], "grey ] [");
    }

    #[test]
    fn test_object_reply_is_not_an_array() {
        let result = extract_json_array(r#"{"rows": [{"price": 1}]}"#);
        assert!(matches!(result, Err(AgentError::Parse(_))));
    }

    #[test]
    fn test_empty_and_truncated_replies() {
        assert!(extract_json_array("").unwrap().is_empty());
        assert!(extract_json_array("```json\n```").unwrap().is_empty());
        assert!(extract_json_array("[{\"price\": 1}, {\"pri").is_err());
        assert!(extract_json_array("no data today").is_err());
    }

    #[test]
    fn test_object_extraction() {
        let value = extract_json_object("```json\n{\"brand\": \"Kia\", \"tags\": [1]}\n```").unwrap();
        assert_eq!(value["brand"], "Kia");
        assert!(extract_json_object("[]").is_err());
    }
}
