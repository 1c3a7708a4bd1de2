//! Vector store trait.
//!
//! The storage-agnostic surface callers program against. The SurrealDB
//! implementation lives in [`crate::storage::vector::SurrealVectorStore`].
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use surrealvec::{Document, SearchRequest, VectorStore};
//!
//! fn index_and_query(store: &dyn VectorStore) -> surrealvec::Result<()> {
//!     store.add(&[Document::new("Use SurrealDB for vector search")])?;
//!     for hit in store.similarity_search(&SearchRequest::new("vector database").with_top_k(3))? {
//!         tracing::info!(id = %hit.id, score = hit.score, "hit");
//!     }
//!     Ok(())
//! }
//! ```

use crate::Result;
use crate::models::{Document, DocumentId, RankedResult, SearchRequest};

/// Trait for vector stores.
///
/// Implementations should be thread-safe (`Send + Sync`) so they can be shared
/// via `Arc<dyn VectorStore>`.
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces documents, computing missing embeddings.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails, a document is invalid, or a write fails.
    /// Documents written before the failure stay written.
    fn add(&self, documents: &[Document]) -> Result<()>;

    /// Removes documents by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete statement fails.
    fn delete(&self, ids: &[DocumentId]) -> Result<()>;

    /// Returns the documents most similar to the request query, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the filter cannot be
    /// compiled, embedding fails, or the result set is malformed.
    fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<RankedResult>>;

    /// Searches with default request parameters.
    ///
    /// # Errors
    ///
    /// See [`VectorStore::similarity_search`].
    fn search_text(&self, query: &str) -> Result<Vec<RankedResult>> {
        self.similarity_search(&SearchRequest::new(query))
    }
}
