//! Structured-output extraction from free-text model replies.
//!
//! Models are prompted for strict JSON but frequently wrap it in prose or
//! code fences. Every call site parses through [`extract_json_object`] and
//! defines its own typed fallback value, so a malformed reply degrades the
//! result instead of failing the operation.

/// Return the first balanced `{...}` substring of the input.
///
/// Scans from the first `{`, tracking brace depth while skipping string
/// literals (and escapes inside them). Returns `None` when no balanced
/// object exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the first balanced JSON object in `text` as `T`.
///
/// Returns `None` on missing or malformed JSON — never an error.
pub fn parse_json_object<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    let raw = extract_json_object(text)?;
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, PartialEq, Debug)]
    struct Sample {
        name: String,
        count: i32,
    }

    #[test]
    fn test_extracts_bare_object() {
        let text = r#"{"name": "bistro", "count": 2}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extracts_object_wrapped_in_prose() {
        let text = "Sure! Here is the JSON you asked for:\n{\"name\": \"bistro\", \"count\": 2}\nHope that helps.";
        let parsed: Sample = parse_json_object(text).unwrap();
        assert_eq!(parsed.name, "bistro");
        assert_eq!(parsed.count, 2);
    }

    #[test]
    fn test_extracts_object_from_code_fence() {
        let text = "```json\n{\"name\": \"x\", \"count\": 1}\n```";
        let parsed: Sample = parse_json_object(text).unwrap();
        assert_eq!(parsed.count, 1);
    }

    #[test]
    fn test_balanced_nested_braces() {
        let text = r#"prefix {"a": {"b": {"c": 1}}} suffix {"ignored": true}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": {"c": 1}}}"#));
    }

    #[test]
    fn test_braces_inside_strings_do_not_count() {
        let text = r#"{"name": "curly } brace {", "count": 3}"#;
        let parsed: Sample = parse_json_object(text).unwrap();
        assert_eq!(parsed.name, "curly } brace {");
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"name": "say \"hi\" {", "count": 4}"#;
        let parsed: Sample = parse_json_object(text).unwrap();
        assert_eq!(parsed.count, 4);
    }

    #[test]
    fn test_no_object_returns_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_unbalanced_object_returns_none() {
        assert_eq!(extract_json_object(r#"{"name": "never closed"#), None);
    }

    #[test]
    fn test_malformed_json_parses_to_none() {
        let parsed: Option<Sample> = parse_json_object("{not valid json}");
        assert!(parsed.is_none());
    }
}
