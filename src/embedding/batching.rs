//! Batching of texts for embedding calls.

use crate::{Error, Result};
use std::ops::Range;

/// Splits a sequence of texts into contiguous batches for embedding.
pub trait BatchingStrategy: Send + Sync {
    /// Returns contiguous, in-order ranges covering every index of `texts`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a text cannot fit in any batch.
    fn batch(&self, texts: &[&str]) -> Result<Vec<Range<usize>>>;
}

/// Packs texts into batches that stay under a model's input-token limit.
///
/// Token counts are estimated as one token per four characters, rounded up.
/// A fraction of the limit is held in reserve to absorb estimation error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenCountBatchingStrategy {
    max_input_tokens: usize,
    reserve_percentage: f64,
}

impl TokenCountBatchingStrategy {
    /// Input-token limit of OpenAI's embedding models.
    pub const DEFAULT_MAX_INPUT_TOKENS: usize = 8191;

    /// Share of the limit held in reserve.
    pub const DEFAULT_RESERVE_PERCENTAGE: f64 = 0.1;

    /// Creates a strategy for `max_input_tokens`, holding back `reserve_percentage`
    /// (clamped to `[0, 1]`).
    #[must_use]
    pub fn new(max_input_tokens: usize, reserve_percentage: f64) -> Self {
        let reserve_percentage = if reserve_percentage.is_nan() {
            Self::DEFAULT_RESERVE_PERCENTAGE
        } else {
            reserve_percentage.clamp(0.0, 1.0)
        };
        Self {
            max_input_tokens,
            reserve_percentage,
        }
    }

    /// Token budget of a single batch.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn budget(&self) -> usize {
        (self.max_input_tokens as f64 * (1.0 - self.reserve_percentage)).floor() as usize
    }

    /// Estimated token count of `text`.
    #[must_use]
    pub fn estimate_tokens(text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

impl Default for TokenCountBatchingStrategy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_INPUT_TOKENS,
            Self::DEFAULT_RESERVE_PERCENTAGE,
        )
    }
}

impl BatchingStrategy for TokenCountBatchingStrategy {
    fn batch(&self, texts: &[&str]) -> Result<Vec<Range<usize>>> {
        let budget = self.budget();
        let mut batches = Vec::new();
        let mut start = 0;
        let mut used = 0;

        for (i, text) in texts.iter().enumerate() {
            let tokens = Self::estimate_tokens(text);
            if tokens > budget {
                return Err(Error::InvalidInput(format!(
                    "text {i} needs about {tokens} tokens, above the batch budget of {budget}"
                )));
            }
            if used + tokens > budget && i > start {
                batches.push(start..i);
                start = i;
                used = 0;
            }
            used += tokens;
        }
        if start < texts.len() {
            batches.push(start..texts.len());
        }

        tracing::trace!(texts = texts.len(), batches = batches.len(), budget, "Planned embedding batches");
        Ok(batches)
    }
}
