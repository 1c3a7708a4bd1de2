//! Mapping of `SELECT` rows to ranked results.

use crate::models::{DISTANCE_METADATA_KEY, DocumentId, Metadata, RankedResult};
use crate::storage::surrealql::RecordId;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Column holding the score of a vector query.
pub(crate) const SCORE_COLUMN: &str = "__score";

/// Column holding the raw kNN distance of a vector query.
pub(crate) const DISTANCE_COLUMN: &str = "__distance";

/// Turns the rows of a ranked vector query into [`RankedResult`]s.
///
/// Each row must be an object with a record id, numeric `__score` and
/// `__distance` columns, and the content field. The embedding field is
/// dropped; every other column becomes metadata, plus the `distance` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMapper {
    content_field: String,
    embedding_field: String,
}

impl RowMapper {
    /// Creates a mapper for the given content and embedding fields.
    #[must_use]
    pub fn new(content_field: impl Into<String>, embedding_field: impl Into<String>) -> Self {
        Self {
            content_field: content_field.into(),
            embedding_field: embedding_field.into(),
        }
    }

    /// Maps a whole result set, preserving row order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResult`] if the result set is not an array or
    /// any row is malformed.
    pub fn map_rows(&self, result: Value) -> Result<Vec<RankedResult>> {
        match result {
            Value::Array(rows) => rows
                .into_iter()
                .enumerate()
                .map(|(i, row)| self.map_row(row).map_err(|e| at_row(i, e)))
                .collect(),
            other => Err(Error::MalformedResult(format!(
                "expected an array of rows, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Maps one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResult`] if the row is not an object or a
    /// required column is missing or has the wrong type.
    pub fn map_row(&self, row: Value) -> Result<RankedResult> {
        let Value::Object(mut fields) = row else {
            return Err(Error::MalformedResult(format!(
                "expected a row object, got {}",
                type_name(&row)
            )));
        };

        let id = fields
            .remove("id")
            .as_ref()
            .and_then(RecordId::parse_key)
            .ok_or_else(|| Error::MalformedResult("row has no record id".to_string()))?;
        let score = take_number(&mut fields, SCORE_COLUMN)?;
        let distance = take_number(&mut fields, DISTANCE_COLUMN)?;
        let content = match fields.remove(&self.content_field) {
            Some(Value::String(text)) => text,
            Some(other) => {
                return Err(Error::MalformedResult(format!(
                    "field '{}' is {}, expected a string",
                    self.content_field,
                    type_name(&other)
                )));
            },
            None => {
                return Err(Error::MalformedResult(format!(
                    "row has no '{}' field",
                    self.content_field
                )));
            },
        };
        fields.remove(&self.embedding_field);

        let mut metadata: Metadata = fields.into_iter().collect();
        metadata.insert(DISTANCE_METADATA_KEY.to_string(), Value::from(distance));

        Ok(RankedResult {
            id: DocumentId::new(id),
            content,
            score,
            distance,
            metadata,
        })
    }
}

fn take_number(fields: &mut Map<String, Value>, column: &str) -> Result<f64> {
    match fields.remove(column) {
        Some(value) => value.as_f64().ok_or_else(|| {
            Error::MalformedResult(format!(
                "column '{column}' is {}, expected a number",
                type_name(&value)
            ))
        }),
        None => Err(Error::MalformedResult(format!(
            "row has no '{column}' column"
        ))),
    }
}

fn at_row(index: usize, error: Error) -> Error {
    match error {
        Error::MalformedResult(message) => Error::MalformedResult(format!("row {index}: {message}")),
        other => other,
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
