//! Best-effort JSON recovery from free-form model output.
//!
//! Even when told to answer with a bare JSON object, models prepend
//! "Sure! Here is…", wrap the object in ```json fences, or append notes.
//! [`extract_json_object`] finds the first balanced `{…}` span; the typed
//! helpers then decode it, reporting *where* recovery failed through
//! [`ExtractError`].

use crate::error::ExtractError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Return the first balanced `{…}` span of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// towards nesting, so `{"a": "}"}` is returned whole.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NotFound)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unbalanced { start })
}

/// Extract and parse the first JSON object without any schema check.
pub fn extract_value(text: &str) -> Result<Value, ExtractError> {
    let raw = extract_json_object(text)?;
    serde_json::from_str(raw).map_err(ExtractError::Malformed)
}

/// Extract the first JSON object and decode it into `T`.
///
/// Syntax errors surface as [`ExtractError::Malformed`]; well-formed JSON of
/// the wrong shape as [`ExtractError::Schema`].
pub fn extract_typed<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let value = extract_value(text)?;
    serde_json::from_value(value).map_err(|e| ExtractError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        title: String,
        description: String,
    }

    #[test]
    fn finds_object_inside_prose() {
        let text = "Sure! Here you go:\n{\"title\": \"A\", \"description\": \"B\"}\nHope this helps.";
        assert_eq!(
            extract_json_object(text).unwrap(),
            "{\"title\": \"A\", \"description\": \"B\"}"
        );
    }

    #[test]
    fn strips_code_fences() {
        let text = "```json\n{\"title\": \"A\", \"description\": \"B\"}\n```";
        let pair: Pair = extract_typed(text).unwrap();
        assert_eq!(pair.title, "A");
    }

    #[test]
    fn nested_objects_are_balanced() {
        let text = r#"x {"a": {"b": {"c": 1}}, "d": 2} trailing {"e": 3}"#;
        assert_eq!(
            extract_json_object(text).unwrap(),
            r#"{"a": {"b": {"c": 1}}, "d": 2}"#
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"title": "use {} and \"}\" freely", "description": "ok"}"#;
        let pair: Pair = extract_typed(text).unwrap();
        assert_eq!(pair.title, r#"use {} and "}" freely"#);
    }

    #[test]
    fn multibyte_text_is_sliced_safely() {
        let text = "Voilà — {\"title\": \"Ünïcödé ✓\", \"description\": \"日本語\"} ✨";
        let pair: Pair = extract_typed(text).unwrap();
        assert_eq!(pair.description, "日本語");
    }

    #[test]
    fn no_object_is_not_found() {
        assert!(matches!(
            extract_json_object("I cannot help with that."),
            Err(ExtractError::NotFound)
        ));
    }

    #[test]
    fn unterminated_object_is_unbalanced() {
        assert!(matches!(
            extract_json_object("ok: {\"title\": \"A\""),
            Err(ExtractError::Unbalanced { start: 4 })
        ));
    }

    #[test]
    fn syntax_error_is_malformed() {
        let err = extract_value("{title: 'A'}").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn wrong_shape_is_schema_error() {
        let err = extract_typed::<Pair>(r#"{"title": "A"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::Schema(_)), "got {err:?}");

        let err = extract_typed::<Pair>(r#"{"title": 1, "description": "B"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::Schema(_)), "got {err:?}");
    }
}
