//! Storage traits.

mod executor;
mod filter;
mod vector;

pub use executor::{QueryExecutor, Response, StatementResult, StatementStatus};
pub use filter::FilterConverter;
pub use vector::VectorStore;
