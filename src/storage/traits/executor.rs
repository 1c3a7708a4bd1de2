//! Query executor trait.
//!
//! An executor sends a [`Query`] to a database and returns one result per
//! statement, in statement order. The store owns no connection of its own; it
//! is handed an `Arc<dyn QueryExecutor>` at construction.

use crate::storage::surrealql::{Query, RecordId, Statement, UpsertMode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Outcome reported for a single statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementStatus {
    /// The statement succeeded.
    Ok,
    /// The statement failed. The result holds the error message.
    Err,
}

/// The result of one statement, as reported by SurrealDB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    /// Statement outcome.
    pub status: StatementStatus,
    /// Execution time as reported by the server.
    #[serde(default)]
    pub time: Option<String>,
    /// Result value (rows, or the error message on failure).
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error detail reported by some server versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatementResult {
    /// A successful result.
    #[must_use]
    pub const fn ok(result: serde_json::Value) -> Self {
        Self {
            status: StatementStatus::Ok,
            time: None,
            result,
            detail: None,
        }
    }

    /// A failed result carrying `message`.
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            status: StatementStatus::Err,
            time: None,
            result: serde_json::Value::String(message.into()),
            detail: None,
        }
    }

    fn error_message(&self) -> String {
        if let Some(detail) = &self.detail {
            return detail.clone();
        }
        match &self.result {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Results of an executed query, one per statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    results: Vec<StatementResult>,
}

impl Response {
    /// Wraps per-statement results.
    #[must_use]
    pub const fn new(results: Vec<StatementResult>) -> Self {
        Self { results }
    }

    /// Returns the number of statement results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns all statement results.
    #[must_use]
    pub fn results(&self) -> &[StatementResult] {
        &self.results
    }

    /// Takes the result value of statement `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailure`] if that statement reported `ERR`,
    /// and [`Error::MalformedResult`] if there is no result at `index`.
    pub fn take(&mut self, index: usize) -> Result<serde_json::Value> {
        let count = self.results.len();
        let entry = self.results.get_mut(index).ok_or_else(|| {
            Error::MalformedResult(format!(
                "expected a result for statement {index}, got {count} results"
            ))
        })?;
        if entry.status == StatementStatus::Err {
            return Err(Error::ExecutionFailure {
                operation: format!("statement {index}"),
                cause: entry.error_message(),
            });
        }
        Ok(std::mem::take(&mut entry.result))
    }

    /// Fails on the first statement that reported `ERR`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailure`] naming the failed statement.
    pub fn check(&self) -> Result<()> {
        match self
            .results
            .iter()
            .enumerate()
            .find(|(_, r)| r.status == StatementStatus::Err)
        {
            Some((index, failed)) => Err(Error::ExecutionFailure {
                operation: format!("statement {index}"),
                cause: failed.error_message(),
            }),
            None => Ok(()),
        }
    }
}

/// Trait for SurrealQL executors.
///
/// Implementations should be thread-safe (`Send + Sync`). Methods use `&self`
/// so an executor can be shared via `Arc<dyn QueryExecutor>`.
pub trait QueryExecutor: Send + Sync {
    /// Executes all statements of `query` and returns their results in order.
    ///
    /// A statement reporting `ERR` is not an error at this level; callers
    /// inspect it through [`Response::take`] or [`Response::check`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailure`] if the query could not be executed
    /// at all (transport failure, HTTP error status, unreadable response).
    fn execute(&self, query: &Query) -> Result<Response>;

    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailure`] if execution or the statement fails.
    fn upsert(
        &self,
        target: RecordId,
        mode: UpsertMode,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        self.execute(&Query::from(Statement::upsert(target, mode, data)))?
            .check()
    }

    /// Removes records in a single statement. An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutionFailure`] if execution or the statement fails.
    fn delete(&self, targets: Vec<RecordId>) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        self.execute(&Query::from(Statement::delete(targets)))?.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_returns_statement_result() {
        let mut response = Response::new(vec![
            StatementResult::ok(json!(null)),
            StatementResult::ok(json!([{"id": "docs:a"}])),
        ]);
        assert_eq!(response.take(1).expect("take"), json!([{"id": "docs:a"}]));
    }

    #[test]
    fn test_take_reports_statement_error() {
        let mut response = Response::new(vec![StatementResult::err("table not found")]);
        let err = response.take(0).expect_err("should fail");
        assert!(matches!(
            err,
            Error::ExecutionFailure { ref cause, .. } if cause == "table not found"
        ));
    }

    #[test]
    fn test_take_out_of_range_is_malformed() {
        let mut response = Response::new(vec![StatementResult::ok(json!([]))]);
        assert!(matches!(response.take(1), Err(Error::MalformedResult(_))));
    }

    #[test]
    fn test_check_finds_first_error() {
        let response = Response::new(vec![
            StatementResult::ok(json!(null)),
            StatementResult::err("first"),
            StatementResult::err("second"),
        ]);
        let err = response.check().expect_err("should fail");
        assert!(err.to_string().contains("statement 1"));
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_deserialize_server_payload() {
        let payload = r#"[
            {"time": "1.2ms", "status": "OK", "result": []},
            {"time": "0.3ms", "status": "ERR", "detail": "Parse error"}
        ]"#;
        let results: Vec<StatementResult> = serde_json::from_str(payload).expect("deserialize");
        assert_eq!(results[0].status, StatementStatus::Ok);
        let response = Response::new(results);
        let err = response.check().expect_err("should fail");
        assert!(err.to_string().contains("Parse error"));
    }
}
