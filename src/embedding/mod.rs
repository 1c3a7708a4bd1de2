//! Embedding generation.
//!
//! The store consumes embeddings through the [`Embedder`] trait. Documents are
//! embedded in batches chosen by a [`BatchingStrategy`], so a model with an
//! input-token limit never receives more than it accepts in one call.

// Allow cast precision loss for hash-based embedding calculations.
#![allow(clippy::cast_precision_loss)]
// Allow cast possible truncation for hash index calculations on 32-bit platforms.
#![allow(clippy::cast_possible_truncation)]

mod batching;
mod fastembed;

pub use batching::{BatchingStrategy, TokenCountBatchingStrategy};
pub use fastembed::FastEmbedEmbedder;

use crate::models::Document;
use crate::{Error, Result};

/// Default embedding dimensions (all-MiniLM-L6-v2).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for embedding generators.
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions. Zero means "unknown", which disables
    /// dimension checks on stored vectors.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generates embeddings for multiple texts.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embeds the content of `documents`, one vector per document, in order.
    ///
    /// Texts are submitted in the batches `strategy` chooses.
    ///
    /// # Errors
    ///
    /// Returns an error if batching or embedding fails, or if the model returns
    /// a different number of vectors than it was given texts.
    fn embed_documents(
        &self,
        documents: &[&Document],
        strategy: &dyn BatchingStrategy,
    ) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for range in strategy.batch(&texts)? {
            let batch = &texts[range];
            let vectors = self.embed_batch(batch)?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "model returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }
}
