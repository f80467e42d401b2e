//! The embedding-source trait.

use crate::error::{LorekeeperError, Result};
use crate::vector::core::vector::Vector;

/// Converts text into dense vectors.
///
/// Implementations must be deterministic for a given model snapshot and must
/// return exactly one vector of [`Embedder::dimension`] elements per input,
/// in input order. Returned vectors need not be normalized; the retriever
/// normalizes them before indexing.
///
/// # Examples
///
/// ```
/// use lorekeeper::embedding::Embedder;
/// use lorekeeper::error::Result;
/// use lorekeeper::vector::Vector;
///
/// struct LengthEmbedder;
///
/// impl Embedder for LengthEmbedder {
///     fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
///         Ok(texts
///             .iter()
///             .map(|t| Vector::new(vec![t.len() as f32 + 1.0, 1.0]))
///             .collect())
///     }
///
///     fn dimension(&self) -> usize {
///         2
///     }
///
///     fn name(&self) -> &str {
///         "length"
///     }
/// }
///
/// let vectors = LengthEmbedder.embed_batch(&["a", "bb"]).unwrap();
/// assert_eq!(vectors.len(), 2);
/// ```
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>>;

    /// Output dimension.
    fn dimension(&self) -> usize;

    /// Identifier recorded in the index snapshot.
    fn name(&self) -> &str;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vector> {
        let mut vectors = self.embed_batch(&[text])?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(LorekeeperError::embedding_unavailable(format!(
                "{} returned an unexpected number of vectors",
                self.name()
            ))),
        }
    }
}
