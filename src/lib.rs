//! # Surrealvec
//!
//! A SurrealDB-backed vector store.
//!
//! Surrealvec turns storage-agnostic similarity search requests (query text,
//! top-K, similarity threshold, metadata filter) into SurrealQL statements that
//! use SurrealDB's native HNSW and M-tree vector indexes, and maps the returned
//! rows back into ranked documents.
//!
//! ## Features
//!
//! - Filter expression compiler (portable filter tree to SurrealQL conditions)
//! - Typed statement AST with validated identifiers and escaped literals
//! - Index lifecycle (`DEFINE INDEX IF NOT EXISTS`) driven by configuration
//! - Pluggable executors (SurrealDB HTTP endpoint, in-process interpreter)
//! - Pluggable embedders with token-count batching
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use surrealvec::{Document, SearchRequest, SurrealVectorStore, VectorStore};
//! use surrealvec::embedding::FastEmbedEmbedder;
//! use surrealvec::storage::executor::InMemoryExecutor;
//!
//! let store = SurrealVectorStore::builder(
//!     Arc::new(InMemoryExecutor::new()),
//!     Arc::new(FastEmbedEmbedder::new()),
//! )
//! .initialize_schema(true)
//! .build()?;
//!
//! store.add(&[Document::new("SurrealDB supports HNSW indexes").with_metadata("year", 2024)])?;
//! let hits = store.similarity_search(
//!     &SearchRequest::new("vector indexes").with_filter_text("year >= 2020")?,
//! )?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod embedding;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{SurrealvecConfig, VectorStoreConfig};
pub use embedding::{BatchingStrategy, Embedder, TokenCountBatchingStrategy};
pub use models::{
    Document, DocumentId, ExpressionType, FilterExpression, FilterValue, Metadata, Operand,
    RankedResult, SearchRequest,
};
pub use storage::surrealql::{Algorithm, Distance, UpsertMode, VectorType};
pub use storage::{FilterConverter, QueryExecutor, SurrealVectorStore, VectorStore};

/// Error type for surrealvec operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Invalid identifiers, malformed filter trees or filter text, bad request parameters |
/// | `UnsupportedOperator` | A filter operator SurrealQL (or the negation rule) cannot express |
/// | `MalformedResult` | A result set or row does not have the expected shape |
/// | `ExecutionFailure` | Transport errors, HTTP errors, statements reporting `ERR` |
/// | `SchemaInitFailure` | `DEFINE INDEX` failed while ensuring the schema |
/// | `Embedding` | The embedding model failed |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A table, field or index name is not a plain identifier
    /// - A filter tree is malformed (missing operand, non-key left side)
    /// - Filter text cannot be parsed
    /// - `top_k` is zero or the similarity threshold is outside `[0, 1]`
    /// - An embedding does not match the embedder's dimensions
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The filter uses an operator the dialect cannot express.
    ///
    /// Raised before any statement is sent, e.g. `NOT` over `<`, `AND` or a group.
    #[error("unsupported operator '{operator}': {context}")]
    UnsupportedOperator {
        /// The offending operator.
        operator: String,
        /// Where the operator was encountered.
        context: String,
    },

    /// A returned result set or row is not in the expected shape.
    ///
    /// Raised when the `SELECT` result is not an array, a row is not an
    /// object, or a required field (`id`, score, distance, content) is missing.
    #[error("malformed result: {0}")]
    MalformedResult(String),

    /// The executor failed.
    ///
    /// Raised when:
    /// - The HTTP request to SurrealDB fails or returns a non-success status
    /// - A statement in the response reports `ERR`
    /// - The in-memory executor rejects a statement
    #[error("operation '{operation}' failed: {cause}")]
    ExecutionFailure {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The vector index could not be defined during schema initialization.
    ///
    /// Fatal to startup. Never retried.
    #[error("schema initialization for index '{index}' failed: {cause}")]
    SchemaInitFailure {
        /// The index being defined.
        index: String,
        /// The underlying cause.
        cause: String,
    },

    /// The embedding model failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Result type alias for surrealvec operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::ExecutionFailure {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::UnsupportedOperator {
            operator: "LT".to_string(),
            context: "NOT".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported operator 'LT': NOT");

        let err = Error::SchemaInitFailure {
            index: "idx".to_string(),
            cause: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema initialization for index 'idx' failed: boom"
        );
    }
}
