//! Document and ranked result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata attached to a document.
///
/// Keys are kept ordered so that generated statements are deterministic.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Metadata key under which search results expose the raw index distance.
pub const DISTANCE_METADATA_KEY: &str = "distance";

/// Unique identifier for a document within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new document ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random (UUID v4) document ID.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A document to be stored in the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    #[serde(default = "DocumentId::random")]
    pub id: DocumentId,
    /// The text content that is embedded and returned by searches.
    pub content: String,
    /// Arbitrary metadata stored alongside the content.
    #[serde(default)]
    pub metadata: Metadata,
    /// Precomputed embedding. Computed by the embedder when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Creates a document with a random ID.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: DocumentId::random(),
            content: content.into(),
            metadata: Metadata::new(),
            embedding: None,
        }
    }

    /// Sets the document ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets a precomputed embedding.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A document returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// Document identifier, without the table prefix.
    pub id: DocumentId,
    /// Document content.
    pub content: String,
    /// Caller-facing similarity score (higher is better).
    pub score: f64,
    /// Raw distance reported by the vector index (lower is better).
    pub distance: f64,
    /// Remaining record fields, plus [`DISTANCE_METADATA_KEY`].
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("hello")
            .with_id("doc-1")
            .with_metadata("year", 2024)
            .with_metadata("draft", false)
            .with_embedding(vec![0.1, 0.2]);

        assert_eq!(doc.id.as_str(), "doc-1");
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.metadata["year"], serde_json::json!(2024));
        assert_eq!(doc.metadata["draft"], serde_json::json!(false));
        assert_eq!(doc.embedding, Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_random_ids_are_unique() {
        let a = Document::new("a");
        let b = Document::new("b");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.as_str().len(), 36);
    }

    #[test]
    fn test_document_deserialize_without_id() {
        let doc: Document =
            serde_json::from_str(r#"{"content": "text", "metadata": {"k": "v"}}"#)
                .expect("deserialize failed");
        assert!(!doc.id.as_str().is_empty());
        assert_eq!(doc.metadata["k"], serde_json::json!("v"));
        assert!(doc.embedding.is_none());
    }
}
