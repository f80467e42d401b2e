//! Query encoding.
//!
//! A raw query string becomes an [`EncodedQuery`]: the normalized text, the
//! token list used for lexical scoring and a unit embedding. The embedding
//! input is the normalized text wrapped in an instruction template; passages
//! are embedded as-is.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::embedding::embedder::Embedder;
use crate::error::{LorekeeperError, Result};
use crate::vector::core::vector::Vector;

/// Placeholder replaced by the query text in an instruction template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Instruction template applied to every query before embedding.
pub const DEFAULT_QUERY_TEMPLATE: &str =
    "Represent this question for retrieving relevant documents: {query}";

/// A query ready for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedQuery {
    /// Trimmed, lower-cased query text.
    pub text: String,
    /// Lexical tokens of `text`.
    pub tokens: Vec<String>,
    /// Unit-norm embedding of the templated text.
    pub vector: Vector,
}

/// Turns raw query text into tokens and an embedding.
///
/// # Examples
///
/// ```
/// use lorekeeper::query::QueryEncoder;
///
/// let encoder = QueryEncoder::default();
/// assert_eq!(
///     encoder.embedding_input("  How does GRAPPLING work? "),
///     "Represent this question for retrieving relevant documents: how does grappling work?"
/// );
/// ```
#[derive(Clone)]
pub struct QueryEncoder {
    template: String,
    tokenizer: Arc<dyn Tokenizer>,
}

impl QueryEncoder {
    /// Create an encoder with a custom template containing `{query}`.
    pub fn new<S: Into<String>>(template: S) -> Result<Self> {
        let template = template.into();
        validate_template(&template)?;
        Ok(Self {
            template,
            tokenizer: Arc::new(RegexTokenizer::default()),
        })
    }

    /// Tokenize queries with `tokenizer` instead of the default rule.
    ///
    /// The lexical index must be built with the same tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// The tokenizer queries are split with.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// The instruction template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Trim and lower-case a raw query.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// The exact string handed to the embedder for `raw`.
    pub fn embedding_input(&self, raw: &str) -> String {
        self.template.replace(QUERY_PLACEHOLDER, &Self::normalize(raw))
    }

    /// Encode `raw` with the given embedding source.
    pub fn encode(&self, raw: &str, embedder: &dyn Embedder) -> Result<EncodedQuery> {
        let text = Self::normalize(raw);
        if text.is_empty() {
            return Err(LorekeeperError::invalid_argument("query text is empty"));
        }

        let tokens = self.tokenizer.tokenize(&text);
        let input = self.template.replace(QUERY_PLACEHOLDER, &text);

        let mut vector = embedder.embed(&input).map_err(|e| match e {
            LorekeeperError::EmbeddingUnavailable(_) => e,
            other => LorekeeperError::embedding_unavailable(other.to_string()),
        })?;

        if !vector.is_valid() || vector.norm() == 0.0 {
            return Err(LorekeeperError::embedding_unavailable(format!(
                "{} produced a degenerate query embedding",
                embedder.name()
            )));
        }
        vector.normalize();

        debug!(query = %text, tokens = tokens.len(), "encoded query");
        Ok(EncodedQuery {
            text,
            tokens,
            vector,
        })
    }
}

impl Default for QueryEncoder {
    fn default() -> Self {
        Self {
            template: DEFAULT_QUERY_TEMPLATE.to_string(),
            tokenizer: Arc::new(RegexTokenizer::default()),
        }
    }
}

impl fmt::Debug for QueryEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEncoder")
            .field("template", &self.template)
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

/// Check that a template carries the `{query}` placeholder.
pub fn validate_template(template: &str) -> Result<()> {
    if !template.contains(QUERY_PLACEHOLDER) {
        return Err(LorekeeperError::invalid_config(format!(
            "query template must contain {QUERY_PLACEHOLDER}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lemma::{LemmatizingTokenizer, PluralLemmatizer};
    use crate::embedding::precomputed::PrecomputedEmbedder;

    struct ZeroEmbedder;

    impl Embedder for ZeroEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vector>> {
            Ok(texts.iter().map(|_| Vector::new(vec![0.0, 0.0])).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "zero"
        }
    }

    #[test]
    fn test_encode_uses_template_and_normalizes() {
        let encoder = QueryEncoder::default();
        let input = encoder.embedding_input("  Goblin Ambush ");
        let embedder = PrecomputedEmbedder::new(2).with(input, vec![3.0, 4.0]).unwrap();

        let encoded = encoder.encode("  Goblin Ambush ", &embedder).unwrap();
        assert_eq!(encoded.text, "goblin ambush");
        assert_eq!(encoded.tokens, vec!["goblin", "ambush"]);
        assert!(encoded.vector.is_unit());
    }

    #[test]
    fn test_custom_template() {
        let encoder = QueryEncoder::new("query: {query}").unwrap();
        assert_eq!(encoder.embedding_input("Dragons"), "query: dragons");

        assert!(matches!(
            QueryEncoder::new("no placeholder").unwrap_err(),
            LorekeeperError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_embedder_failure_is_embedding_unavailable() {
        let encoder = QueryEncoder::default();
        let err = encoder.encode("dragons", &PrecomputedEmbedder::new(2)).unwrap_err();
        assert!(matches!(err, LorekeeperError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_zero_embedding_rejected() {
        let err = QueryEncoder::default().encode("dragons", &ZeroEmbedder).unwrap_err();
        assert!(matches!(err, LorekeeperError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = QueryEncoder::default().encode("   ", &ZeroEmbedder).unwrap_err();
        assert!(matches!(err, LorekeeperError::InvalidArgument(_)));
    }

    #[test]
    fn test_custom_tokenizer_only_changes_tokens() {
        let lemmatized = LemmatizingTokenizer::new(Arc::new(RegexTokenizer::default()), Arc::new(PluralLemmatizer));
        let encoder = QueryEncoder::default().with_tokenizer(Arc::new(lemmatized));
        assert_eq!(encoder.tokenizer().name(), "lemmatized");

        let input = encoder.embedding_input("Goblins Ambush");
        assert_eq!(input, QueryEncoder::default().embedding_input("Goblins Ambush"));

        let embedder = PrecomputedEmbedder::new(2).with(input, vec![1.0, 0.0]).unwrap();
        let encoded = encoder.encode("Goblins Ambush", &embedder).unwrap();
        assert_eq!(encoded.text, "goblins ambush");
        assert_eq!(encoded.tokens, vec!["goblin", "ambush"]);
    }
}
