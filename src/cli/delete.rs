//! Delete CLI command.

use super::write_error;
use crate::models::DocumentId;
use crate::{Result, SurrealVectorStore, VectorStore};
use std::io::Write;

/// Removes documents by id in a single statement.
///
/// Unknown ids are ignored by the database, so the count reported is the
/// number of ids submitted.
///
/// # Errors
///
/// Returns an error if the delete statement fails.
pub fn cmd_delete(store: &SurrealVectorStore, ids: &[String], out: &mut dyn Write) -> Result<()> {
    if ids.is_empty() {
        writeln!(out, "No document ids provided").map_err(write_error)?;
        return Ok(());
    }

    let ids: Vec<DocumentId> = ids.iter().map(|id| DocumentId::new(id.as_str())).collect();
    store.delete(&ids)?;
    writeln!(
        out,
        "Deleted {} id(s) from {}",
        ids.len(),
        store.table_name()
    )
    .map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Backend, build_store};
    use crate::config::SurrealvecConfig;
    use crate::models::{Document, SearchRequest};

    #[test]
    fn test_delete_removes_documents() {
        let store =
            build_store(&SurrealvecConfig::default(), Backend::InMemory, false).expect("store");
        store
            .add(&[Document::new("one").with_id("a"), Document::new("two").with_id("b")])
            .expect("add");

        let mut out = Vec::new();
        cmd_delete(&store, &["a".to_string()], &mut out).expect("delete");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Deleted 1 id(s) from surrealvec_embedding\n"
        );

        let remaining = store
            .similarity_search(&SearchRequest::new("one").with_top_k(10))
            .expect("search");
        let ids: Vec<&str> = remaining.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_empty_ids() {
        let store =
            build_store(&SurrealvecConfig::default(), Backend::InMemory, false).expect("store");
        let mut out = Vec::new();
        cmd_delete(&store, &[], &mut out).expect("delete");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No document ids provided\n");
    }
}
