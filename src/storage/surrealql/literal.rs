//! SurrealQL literal rendering.

use super::ident::is_identifier;
use std::fmt::Write as _;

/// Renders a single-quoted string literal, escaping `\` and `'`.
#[must_use]
pub fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' | '\'' => {
                out.push('\\');
                out.push(c);
            },
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Renders a vector as a compact array literal: `[0.1,0.2,0.3]`.
#[must_use]
pub fn vector_literal(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(ToString::to_string).collect();
    format!("[{}]", values.join(","))
}

/// Renders a JSON value as a SurrealQL literal.
///
/// Object keys that are not plain identifiers are quoted.
#[must_use]
pub fn json_literal(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_json(&mut out, value);
    out
}

fn write_json(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => out.push_str("NULL"),
        serde_json::Value::Bool(b) => {
            let _ = write!(out, "{b}");
        },
        serde_json::Value::Number(n) => {
            let _ = write!(out, "{n}");
        },
        serde_json::Value::String(s) => out.push_str(&quote_str(s)),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json(out, item);
            }
            out.push(']');
        },
        serde_json::Value::Object(map) => {
            write_object(out, map.iter());
        },
    }
}

/// Writes `{ key: value, ... }` for the given entries.
pub(crate) fn write_object<'a>(
    out: &mut String,
    entries: impl Iterator<Item = (&'a String, &'a serde_json::Value)>,
) {
    out.push_str("{ ");
    let mut first = true;
    for (key, value) in entries {
        if !first {
            out.push_str(", ");
        }
        first = false;
        if is_identifier(key) {
            out.push_str(key);
        } else {
            out.push_str(&quote_str(key));
        }
        out.push_str(": ");
        write_json(out, value);
    }
    out.push_str(" }");
}

/// Converts an `f32` to a JSON number using its shortest decimal form.
///
/// A plain widening cast would turn `0.1f32` into `0.10000000149011612`.
#[must_use]
pub fn f32_to_json(value: f32) -> serde_json::Value {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(serde_json::Value::Null, serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_str_escapes() {
        assert_eq!(quote_str("drama"), "'drama'");
        assert_eq!(quote_str("it's"), "'it\\'s'");
        assert_eq!(quote_str("a\\b"), "'a\\\\b'");
        assert_eq!(quote_str(""), "''");
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.1, 0.25, 1.0]), "[0.1,0.25,1]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_json_literal() {
        assert_eq!(json_literal(&json!(null)), "NULL");
        assert_eq!(json_literal(&json!([1, "a", true])), "[1,'a',true]");
        assert_eq!(
            json_literal(&json!({"author": "john", "page count": 3})),
            "{ author: 'john', 'page count': 3 }"
        );
        assert_eq!(json_literal(&json!({})), "{  }");
    }

    #[test]
    fn test_f32_to_json_keeps_short_form() {
        assert_eq!(f32_to_json(0.1), json!(0.1));
        assert_eq!(f32_to_json(-2.5), json!(-2.5));
        assert_eq!(f32_to_json(f32::NAN), json!(null));
    }
}
