//! Redacted input summaries for request-start records.

use serde_json::{Map, Value};

const REDACTED: &str = "[REDACTED]";
const MAX_STRING_CHARS: usize = 100;
const SENSITIVE_MARKERS: &[&str] = &["key", "token", "secret", "password", "authorization"];

fn is_sensitive(field: &str) -> bool {
    let lowered = field.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Copy of `input` safe to log: credential-like fields are masked and long
/// strings are cut at 100 characters.
pub fn summarize_input(input: &Value) -> Value {
    match input {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let summarized = if is_sensitive(k) {
                    Value::String(REDACTED.to_string())
                } else {
                    summarize_input(v)
                };
                out.insert(k.clone(), summarized);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(summarize_input).collect()),
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            let truncated: String = s.chars().take(MAX_STRING_CHARS).collect();
            Value::String(format!("{}…", truncated))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_masks_nested_credentials() {
        let input = json!({
            "query": "위로가 되는 시",
            "apiKey": "AIza-real",
            "auth": {"accessToken": "t", "scope": "read"},
            "items": [{"client_secret": "s"}]
        });
        let summary = summarize_input(&input);
        assert_eq!(summary["query"], "위로가 되는 시");
        assert_eq!(summary["apiKey"], REDACTED);
        assert_eq!(summary["auth"]["accessToken"], REDACTED);
        assert_eq!(summary["auth"]["scope"], "read");
        assert_eq!(summary["items"][0]["client_secret"], REDACTED);
    }

    #[test]
    fn test_truncates_long_strings_by_chars() {
        let long = "가".repeat(150);
        let summary = summarize_input(&json!({ "prompt": long }));
        let text = summary["prompt"].as_str().unwrap();
        assert_eq!(text.chars().count(), MAX_STRING_CHARS + 1);
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(summarize_input(&json!(3)), json!(3));
        assert_eq!(summarize_input(&json!(null)), json!(null));
    }
}
