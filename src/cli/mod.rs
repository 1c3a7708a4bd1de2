//! CLI command implementations.
//!
//! Each submodule implements one `surrealvec` command. Commands write their
//! output to a caller-supplied writer so they can be exercised in tests.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init-schema` | Define the vector index (`DEFINE INDEX IF NOT EXISTS`) |
//! | `add` | Add documents from a JSON file |
//! | `search` | Run a similarity search |
//! | `explain` | Print the statements a search would send, without running it |
//! | `delete` | Remove documents by id |
//! | `render-filter` | Compile filter text to a SurrealQL condition |
//!
//! # Example Usage
//!
//! ```bash
//! # Create the index, then load documents
//! surrealvec init-schema
//! surrealvec add --file docs.json
//!
//! # Search with a metadata filter
//! surrealvec search "vector databases" --top-k 3 --filter "year >= 2020 && lang == 'en'"
//!
//! # Inspect the generated SurrealQL
//! surrealvec explain "vector databases" --filter "tag in ['db', 'ai']"
//! ```

mod add;
mod delete;
mod filter;
mod schema;
mod search;

pub use add::{cmd_add, load_documents};
pub use delete::cmd_delete;
pub use filter::cmd_render_filter;
pub use schema::cmd_init_schema;
pub use search::{OutputFormat, SearchArgs, cmd_explain, cmd_search};

use crate::config::SurrealvecConfig;
use crate::embedding::FastEmbedEmbedder;
use crate::storage::executor::{HttpExecutor, InMemoryExecutor};
use crate::storage::traits::QueryExecutor;
use crate::{Error, Result, SurrealVectorStore};
use std::sync::Arc;

/// Where commands send their statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// The SurrealDB server from the connection settings.
    #[default]
    Http,
    /// A fresh in-process executor. Nothing persists between invocations.
    InMemory,
}

/// Builds the store for a command.
///
/// The in-memory backend always defines the index, since it starts empty.
///
/// # Errors
///
/// Returns an error if the store configuration is invalid or the index
/// cannot be defined.
pub fn build_store(
    config: &SurrealvecConfig,
    backend: Backend,
    initialize_schema: bool,
) -> Result<SurrealVectorStore> {
    let executor: Arc<dyn QueryExecutor> = match backend {
        Backend::Http => Arc::new(HttpExecutor::from_config(&config.connection)),
        Backend::InMemory => Arc::new(InMemoryExecutor::new()),
    };
    tracing::debug!(?backend, endpoint = %config.connection.endpoint, "Building vector store");

    SurrealVectorStore::builder(executor, Arc::new(FastEmbedEmbedder::new()))
        .config(config.store.clone())
        .initialize_schema(
            initialize_schema || config.store.initialize_schema || backend == Backend::InMemory,
        )
        .build()
}

/// Maps an output error.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn write_error(e: std::io::Error) -> Error {
    Error::ExecutionFailure {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}
