//! Init-schema CLI command.

use super::{Backend, build_store, write_error};
use crate::Result;
use crate::config::SurrealvecConfig;
use std::io::Write;

/// Defines the vector index and prints the statement that was sent.
///
/// # Errors
///
/// Returns [`crate::Error::SchemaInitFailure`] if the index cannot be defined.
pub fn cmd_init_schema(
    config: &SurrealvecConfig,
    backend: Backend,
    out: &mut dyn Write,
) -> Result<()> {
    let store = build_store(config, backend, true)?;
    let statement = store.define_index_statement()?;
    writeln!(out, "{statement};").map_err(write_error)?;
    writeln!(
        out,
        "Index '{}' ready on {}.{}",
        store.index_name(),
        store.table_name(),
        store.embedding_field_name()
    )
    .map_err(write_error)
}
