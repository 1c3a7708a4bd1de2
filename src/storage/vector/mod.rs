//! Vector store implementations.

mod row;
mod surreal;

pub use row::RowMapper;
pub use surreal::{SurrealVectorStore, SurrealVectorStoreBuilder};
