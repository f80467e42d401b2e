//! Embedder backed by vectors computed ahead of time.
//!
//! Vectors are looked up by exact text. A miss is reported as
//! [`LorekeeperError::EmbeddingUnavailable`], the same failure a remote
//! model would surface, so tests can pin exact geometry and still exercise
//! the failure paths.

use ahash::AHashMap;

use crate::embedding::embedder::Embedder;
use crate::error::{LorekeeperError, Result};
use crate::vector::core::vector::Vector;

/// Exact-text lookup table of vectors.
///
/// # Examples
///
/// ```
/// use lorekeeper::embedding::{Embedder, PrecomputedEmbedder};
///
/// let embedder = PrecomputedEmbedder::new(2)
///     .with("fireball", vec![1.0, 0.0])
///     .unwrap();
///
/// assert!(embedder.embed("fireball").is_ok());
/// assert!(embedder.embed("frostbolt").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PrecomputedEmbedder {
    dimension: usize,
    vectors: AHashMap<String, Vector>,
}

impl PrecomputedEmbedder {
    /// Create an empty table for vectors of `dimension` elements.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: AHashMap::new(),
        }
    }

    /// Register the vector for `text`, replacing any previous entry.
    pub fn insert<T, V>(&mut self, text: T, vector: V) -> Result<()>
    where
        T: Into<String>,
        V: Into<Vector>,
    {
        let vector = vector.into();
        vector.validate_dimension(self.dimension)?;
        self.vectors.insert(text.into(), vector);
        Ok(())
    }

    /// Builder form of [`PrecomputedEmbedder::insert`].
    pub fn with<T, V>(mut self, text: T, vector: V) -> Result<Self>
    where
        T: Into<String>,
        V: Into<Vector>,
    {
        self.insert(text, vector)?;
        Ok(self)
    }

    /// Number of registered texts.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no texts are registered.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Whether `text` has a registered vector.
    pub fn contains(&self, text: &str) -> bool {
        self.vectors.contains_key(text)
    }
}

impl Embedder for PrecomputedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
        texts
            .iter()
            .map(|text| {
                self.vectors.get(*text).cloned().ok_or_else(|| {
                    LorekeeperError::embedding_unavailable(format!(
                        "no precomputed vector for {text:?}"
                    ))
                })
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "precomputed"
    }
}
