//! Identifiers, parameters and record ids.
//!
//! Table, field and index names are interpolated into statements verbatim, so
//! they are validated once, when an [`Ident`] is constructed. Record keys are
//! arbitrary strings and are always emitted in the escaped `⟨...⟩` form.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static IDENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|_| unreachable!())
});

/// Returns true if `name` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    IDENT_PATTERN.is_match(name)
}

/// Returns true if `path` is a dotted identifier path such as `meta.year`.
#[must_use]
pub fn is_field_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_identifier)
}

/// A validated SurrealQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `name` contains anything other than
    /// ASCII letters, digits and underscores, or starts with a digit.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidInput(format!(
                "'{name}' is not a valid identifier (expected [A-Za-z_][A-Za-z0-9_]*)"
            )))
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A query parameter (`$name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param(Ident);

impl Param {
    /// Creates a parameter from a validated identifier.
    #[must_use]
    pub const fn new(name: Ident) -> Self {
        Self(name)
    }

    /// Returns the parameter name without the `$` prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A record reference (`table:⟨key⟩`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    table: Ident,
    key: String,
}

impl RecordId {
    /// Creates a record id in `table`.
    #[must_use]
    pub fn new(table: Ident, key: impl Into<String>) -> Self {
        Self {
            table,
            key: key.into(),
        }
    }

    /// Returns the table.
    #[must_use]
    pub const fn table(&self) -> &Ident {
        &self.table
    }

    /// Returns the unescaped record key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Extracts the record key from a record reference returned by SurrealDB.
    ///
    /// Accepts the string forms `table:key`, `table:⟨key⟩` and `` table:`key` ``
    /// as well as the object form `{ "tb": ..., "id": ... }`.
    #[must_use]
    pub fn parse_key(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::String(s) => {
                let (_, key) = s.split_once(':')?;
                Some(unescape_key(key))
            },
            serde_json::Value::Object(map) => match map.get("id")? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Object(inner) => match inner.get("String")? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:⟨", self.table)?;
        for c in self.key.chars() {
            if c == '⟩' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("⟩")
    }
}

/// Removes `⟨...⟩` or backtick delimiters and their escapes from a record key.
fn unescape_key(key: &str) -> String {
    let inner = key
        .strip_prefix('⟨')
        .and_then(|k| k.strip_suffix('⟩'))
        .or_else(|| key.strip_prefix('`').and_then(|k| k.strip_suffix('`')));

    let Some(inner) = inner else {
        return key.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ident_validation() {
        assert!(Ident::new("embedding").is_ok());
        assert!(Ident::new("_private_1").is_ok());
        assert!(Ident::new("1abc").is_err());
        assert!(Ident::new("").is_err());
        assert!(Ident::new("drop table").is_err());
        assert!(Ident::new("a;DELETE").is_err());
        assert!(Ident::new("naïve").is_err());
    }

    #[test]
    fn test_field_path() {
        assert!(is_field_path("year"));
        assert!(is_field_path("meta.year"));
        assert!(!is_field_path("meta..year"));
        assert!(!is_field_path(".year"));
        assert!(!is_field_path(""));
        assert!(!is_field_path("year = 1 OR 1"));
    }

    #[test]
    fn test_param_display() {
        let param = Param::new(Ident::new("__embedding").expect("valid ident"));
        assert_eq!(param.to_string(), "$__embedding");
        assert_eq!(param.name(), "__embedding");
    }

    #[test]
    fn test_record_id_display_escapes() {
        let table = Ident::new("docs").expect("valid ident");
        assert_eq!(RecordId::new(table.clone(), "doc-1").to_string(), "docs:⟨doc-1⟩");
        assert_eq!(RecordId::new(table, "a⟩b\\c").to_string(), "docs:⟨a\\⟩b\\\\c⟩");
    }

    #[test]
    fn test_parse_key_forms() {
        assert_eq!(RecordId::parse_key(&json!("docs:abc")), Some("abc".to_string()));
        assert_eq!(RecordId::parse_key(&json!("docs:⟨doc-1⟩")), Some("doc-1".to_string()));
        assert_eq!(RecordId::parse_key(&json!("docs:`doc-1`")), Some("doc-1".to_string()));
        assert_eq!(RecordId::parse_key(&json!({"tb": "docs", "id": "x"})), Some("x".to_string()));
        assert_eq!(
            RecordId::parse_key(&json!({"tb": "docs", "id": {"String": "y"}})),
            Some("y".to_string())
        );
        assert_eq!(RecordId::parse_key(&json!({"tb": "docs", "id": 7})), Some("7".to_string()));
        assert_eq!(RecordId::parse_key(&json!("no-colon")), None);
        assert_eq!(RecordId::parse_key(&json!(42)), None);
    }

    #[test]
    fn test_record_id_roundtrip_through_display() {
        let table = Ident::new("docs").expect("valid ident");
        let id = RecordId::new(table, "we⟩ird\\key");
        let parsed = RecordId::parse_key(&json!(id.to_string()));
        assert_eq!(parsed.as_deref(), Some("we⟩ird\\key"));
    }
}
