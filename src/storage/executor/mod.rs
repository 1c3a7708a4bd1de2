//! Query executors.
//!
//! | Executor | Use Case |
//! |----------|----------|
//! | [`HttpExecutor`] | A SurrealDB server reached through its `/sql` endpoint |
//! | [`InMemoryExecutor`] | In-process tables for local runs, tests and benchmarks |

mod http;
mod memory;

pub use http::HttpExecutor;
pub use memory::InMemoryExecutor;
