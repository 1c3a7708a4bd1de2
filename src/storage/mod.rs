//! Storage layer.
//!
//! - **Traits**: [`VectorStore`], [`QueryExecutor`], [`FilterConverter`]
//! - **SurrealQL**: typed statements, identifiers, literals and the filter compiler
//! - **Executors**: SurrealDB over HTTP, and an in-process interpreter
//! - **Vector**: the SurrealDB vector store

// Allow cast precision loss for score calculations where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]
// Allow significant_drop_tightening - the executor lock is held for a whole query.
#![allow(clippy::significant_drop_tightening)]
// Allow match_same_arms for explicit enum handling.
#![allow(clippy::match_same_arms)]

pub mod executor;
pub mod surrealql;
pub mod traits;
pub mod vector;

pub use traits::{FilterConverter, QueryExecutor, Response, VectorStore};
pub use vector::{SurrealVectorStore, SurrealVectorStoreBuilder};
