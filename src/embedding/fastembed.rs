//! FastEmbed-based embedder.
//!
//! With the `fastembed-embeddings` feature this runs all-MiniLM-L6-v2 through
//! ONNX. Without it, the same type produces deterministic hash-based
//! pseudo-embeddings: stable, normalized, and free of any model download, but
//! with no semantic meaning. Good for local runs and tests; not for real search.

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::{Error, Result};

#[cfg(feature = "fastembed-embeddings")]
mod native {
    use super::{DEFAULT_DIMENSIONS, Embedder, Error, Result};
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::OnceLock;
    use std::time::Instant;

    /// Model shared by every embedder instance, loaded on first use.
    static EMBEDDING_MODEL: OnceLock<fastembed::TextEmbedding> = OnceLock::new();

    /// Embedder backed by all-MiniLM-L6-v2.
    pub struct FastEmbedEmbedder;

    impl FastEmbedEmbedder {
        /// Embedding dimensions of all-MiniLM-L6-v2.
        pub const DEFAULT_DIMENSIONS: usize = DEFAULT_DIMENSIONS;

        /// Creates an embedder. The model loads on the first `embed` call.
        #[must_use]
        pub const fn new() -> Self {
            Self
        }

        /// Name of the underlying model.
        #[must_use]
        pub const fn model_name(&self) -> &'static str {
            "all-MiniLM-L6-v2"
        }

        fn model() -> Result<&'static fastembed::TextEmbedding> {
            if let Some(model) = EMBEDDING_MODEL.get() {
                return Ok(model);
            }

            tracing::info!("Loading embedding model (first use)...");
            let start = Instant::now();
            let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false);
            let model = fastembed::TextEmbedding::try_new(options)
                .map_err(|e| Error::Embedding(format!("failed to load model: {e}")))?;
            tracing::info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                model = "all-MiniLM-L6-v2",
                "Embedding model loaded"
            );

            // Another thread may have won the race; either model is fine.
            let _ = EMBEDDING_MODEL.set(model);
            EMBEDDING_MODEL
                .get()
                .ok_or_else(|| Error::Embedding("embedding model unavailable".to_string()))
        }

        fn run(texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            let model = Self::model()?;
            let count = texts.len();
            // ONNX runtime can panic on malformed input; surface it as an error.
            catch_unwind(AssertUnwindSafe(|| model.embed(texts, None)))
                .map_err(|panic_info| {
                    let message = panic_info
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic_info.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(panic_message = %message, batch_size = count, "ONNX runtime panicked");
                    Error::Embedding(format!("ONNX runtime panic: {message}"))
                })?
                .map_err(|e| Error::Embedding(e.to_string()))
        }
    }

    impl Default for FastEmbedEmbedder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn dimensions(&self) -> usize {
            Self::DEFAULT_DIMENSIONS
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
            }
            Self::run(vec![text.to_string()])?
                .into_iter()
                .next()
                .ok_or_else(|| Error::Embedding("no embedding returned from model".to_string()))
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            if texts.iter().any(|t| t.is_empty()) {
                return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
            }
            Self::run(texts.iter().map(|s| (*s).to_string()).collect())
        }
    }
}

#[cfg(not(feature = "fastembed-embeddings"))]
mod pseudo {
    use super::{DEFAULT_DIMENSIONS, Embedder, Error, Result};

    /// Hash-based stand-in for the ONNX embedder.
    ///
    /// Each token (lowercased word) and each character trigram of the text is
    /// hashed into a few buckets with a sign, and the result is L2-normalized.
    /// Texts sharing words or spelling land close together, which is enough to
    /// exercise ranking without a model.
    pub struct FastEmbedEmbedder {
        dimensions: usize,
    }

    impl FastEmbedEmbedder {
        /// Embedding dimensions of all-MiniLM-L6-v2.
        pub const DEFAULT_DIMENSIONS: usize = DEFAULT_DIMENSIONS;

        /// Upper bound on hashed features per text.
        const MAX_FEATURES: usize = 4096;

        /// Creates an embedder with the default dimensions.
        #[must_use]
        pub const fn new() -> Self {
            Self {
                dimensions: Self::DEFAULT_DIMENSIONS,
            }
        }

        /// Creates an embedder producing `dimensions`-long vectors (at least 1).
        #[must_use]
        pub const fn with_dimensions(dimensions: usize) -> Self {
            Self {
                dimensions: if dimensions == 0 { 1 } else { dimensions },
            }
        }

        /// Name of the underlying model.
        #[must_use]
        pub const fn model_name(&self) -> &'static str {
            "pseudo-hash"
        }

        fn pseudo_embed(&self, text: &str) -> Vec<f32> {
            let mut embedding = vec![0.0f32; self.dimensions];
            let lowered = text.to_lowercase();

            let words = lowered.split_whitespace().map(|w| (w.as_bytes(), 1.0f32));
            let chars: Vec<char> = lowered.chars().collect();
            let trigrams = chars.windows(3).map(|w| {
                let s: String = w.iter().collect();
                (fnv1a(s.as_bytes()), 0.5f32)
            });

            for (hash, weight) in words
                .map(|(bytes, weight)| (fnv1a(bytes), weight))
                .chain(trigrams)
                .take(Self::MAX_FEATURES)
            {
                let index = (hash % self.dimensions as u64) as usize;
                let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
                embedding[index] += sign * weight;
            }

            let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut embedding {
                    *value /= norm;
                }
            }
            embedding
        }
    }

    /// 64-bit FNV-1a, stable across platforms and releases.
    fn fnv1a(bytes: &[u8]) -> u64 {
        bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(0x0100_0000_01b3)
        })
    }

    impl Default for FastEmbedEmbedder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.is_empty() {
                return Err(Error::InvalidInput("Cannot embed empty text".to_string()));
            }
            tracing::trace!("Using pseudo-embeddings (fastembed-embeddings feature not enabled)");
            Ok(self.pseudo_embed(text))
        }
    }
}

#[cfg(feature = "fastembed-embeddings")]
pub use native::FastEmbedEmbedder;

#[cfg(not(feature = "fastembed-embeddings"))]
pub use pseudo::FastEmbedEmbedder;
