//! Rendering of JSON values as query-language literals.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\x00\n\r\x08\t\\"\x1a]"#).expect("static pattern"));

/// Convert a value into its literal form.
///
/// Strings are double-quoted with control characters, quotes and
/// backslashes escaped; everything else is emitted as-is.
///
/// ```
/// use clusterpoint::escape;
/// use serde_json::json;
///
/// assert_eq!(escape(&json!(null)), "null");
/// assert_eq!(escape(&json!(true)), "true");
/// assert_eq!(escape(&json!(1)), "1");
/// assert_eq!(escape(&json!("O\"Hara")), r#""O\"Hara""#);
/// ```
pub fn escape(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => escape_str(s),
        // Compound values have no literal form of their own; JSON text is
        // what the server's expression language accepts for them.
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Quote and escape a string literal.
pub fn escape_str(s: &str) -> String {
    let body = SPECIAL_CHARS.replace_all(s, |caps: &Captures| {
        match &caps[0] {
            "\0" => "\\0",
            "\n" => "\\n",
            "\r" => "\\r",
            "\u{8}" => "\\b",
            "\t" => "\\t",
            "\u{1a}" => "\\Z",
            "\"" => "\\\"",
            _ => "\\\\",
        }
        .to_string()
    });
    format!("\"{}\"", body)
}

/// Flatten a JSON object into `path = literal` assignments for an
/// `UPDATE ... SET` statement. Nested objects produce dotted paths.
pub fn field_assignments(data: &Map<String, Value>) -> Vec<String> {
    let mut out = Vec::new();
    collect_assignments(data, "", &mut out);
    out
}

fn collect_assignments(data: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in data {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => collect_assignments(nested, &path, out),
            other => out.push(format!("{} = {}", path, escape(other))),
        }
    }
}
