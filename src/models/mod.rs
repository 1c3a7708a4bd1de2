//! Data models for surrealvec.
//!
//! This module contains the documents, ranked results, filter trees and search
//! requests exchanged with the vector store.

mod document;
mod filter;
mod search;

pub use document::{DISTANCE_METADATA_KEY, Document, DocumentId, Metadata, RankedResult};
pub use filter::{ExpressionType, FilterExpression, FilterValue, Operand};
pub use search::{DEFAULT_TOP_K, SIMILARITY_THRESHOLD_ACCEPT_ALL, SearchRequest};
