//! Add CLI command.
//!
//! Reads a JSON array of documents:
//!
//! ```json
//! [
//!   { "id": "doc-1", "content": "SurrealDB supports HNSW", "metadata": { "year": 2024 } },
//!   { "content": "An id is generated when absent" }
//! ]
//! ```

use super::write_error;
use crate::models::Document;
use crate::{Error, Result, SurrealVectorStore, VectorStore};
use std::io::Write;
use std::path::Path;

/// Reads documents from a JSON file.
///
/// # Errors
///
/// Returns [`Error::ExecutionFailure`] if the file cannot be read and
/// [`Error::InvalidInput`] if it is not a JSON array of documents.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::ExecutionFailure {
        operation: "read_documents".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::InvalidInput(format!(
            "{} is not a JSON array of documents: {e}",
            path.display()
        ))
    })
}

/// Adds the documents in `path` and reports how many were written.
///
/// With `batched`, all documents are written in one transaction.
///
/// # Errors
///
/// Returns an error if the file is invalid or a write fails.
pub fn cmd_add(
    store: &SurrealVectorStore,
    path: &Path,
    batched: bool,
    out: &mut dyn Write,
) -> Result<usize> {
    let documents = load_documents(path)?;
    if batched {
        store.add_batched(&documents)?;
    } else {
        store.add(&documents)?;
    }

    for document in &documents {
        writeln!(out, "{}", document.id).map_err(write_error)?;
    }
    writeln!(
        out,
        "Added {} document(s) to {}",
        documents.len(),
        store.table_name()
    )
    .map_err(write_error)?;
    Ok(documents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Backend, build_store};
    use crate::config::SurrealvecConfig;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_add_from_file() {
        let file = write_file(
            r#"[{"id": "a", "content": "first", "metadata": {"year": 2024}}, {"content": "second"}]"#,
        );
        let store =
            build_store(&SurrealvecConfig::default(), Backend::InMemory, false).expect("store");

        let mut out = Vec::new();
        let added = cmd_add(&store, file.path(), false, &mut out).expect("add");

        assert_eq!(added, 2);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("a\n"));
        assert!(text.ends_with("Added 2 document(s) to surrealvec_embedding\n"));
    }

    #[test]
    fn test_batched_add() {
        let file = write_file(r#"[{"id": "a", "content": "first"}]"#);
        let store =
            build_store(&SurrealvecConfig::default(), Backend::InMemory, false).expect("store");
        assert_eq!(
            cmd_add(&store, file.path(), true, &mut Vec::new()).expect("add"),
            1
        );
    }

    #[test]
    fn test_rejects_non_array() {
        let file = write_file(r#"{"content": "not in an array"}"#);
        assert!(matches!(
            load_documents(file.path()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            load_documents(&dir.path().join("absent.json")),
            Err(Error::ExecutionFailure { .. })
        ));
    }
}
