//! Similarity search requests.

use super::FilterExpression;
use crate::{Error, Result};

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 4;

/// Similarity threshold that accepts every result.
pub const SIMILARITY_THRESHOLD_ACCEPT_ALL: f64 = 0.0;

/// A similarity search request.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `query` | Text embedded to form the query vector |
/// | `top_k` | Maximum number of results (must be positive) |
/// | `similarity_threshold` | Results scoring below this floor are dropped (0.0 to 1.0) |
/// | `filter` | Optional metadata filter |
///
/// The threshold is applied after the database returns ranked rows; the index
/// itself ranks by raw distance and has no notion of a score floor.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,
    /// Maximum number of results.
    pub top_k: usize,
    /// Minimum score for a result to be returned.
    pub similarity_threshold: f64,
    /// Optional metadata filter.
    pub filter: Option<FilterExpression>,
}

impl SearchRequest {
    /// Creates a request with default `top_k` and an accept-all threshold.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: SIMILARITY_THRESHOLD_ACCEPT_ALL,
            filter: None,
        }
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub const fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Sets the metadata filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Parses and sets the metadata filter from filter text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text cannot be parsed.
    pub fn with_filter_text(self, text: &str) -> Result<Self> {
        let filter = crate::services::parse_filter_expression(text)?;
        Ok(self.with_filter(filter))
    }

    /// Checks `top_k` and the threshold range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `top_k` is zero or the threshold is
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidInput("top_k must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidInput(format!(
                "similarity threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}
