//! Tokenizer implementations for text analysis.
//!
//! Tokenizers turn raw text into the lexical tokens that the BM25 index stores
//! and that queries are scored with. The same tokenizer instance is used for
//! both sides, so passages and queries always agree on the rule.
//!
//! # Examples
//!
//! ```
//! use lorekeeper::analysis::tokenizer::Tokenizer;
//! use lorekeeper::analysis::tokenizer::regex::RegexTokenizer;
//!
//! let tokenizer = RegexTokenizer::new().unwrap();
//! assert_eq!(tokenizer.tokenize("Fire-Ball!"), vec!["fire", "ball"]);
//! ```

pub mod regex;

/// Trait for tokenizers that convert text into lexical tokens.
///
/// The trait requires `Send + Sync` so a tokenizer can be shared by every
/// reader of an index snapshot. Implementations may wrap another tokenizer to
/// add an external step such as lemmatization.
///
/// # Examples
///
/// Implementing a custom tokenizer:
///
/// ```
/// use lorekeeper::analysis::tokenizer::Tokenizer;
///
/// struct CommaTokenizer;
///
/// impl Tokenizer for CommaTokenizer {
///     fn tokenize(&self, text: &str) -> Vec<String> {
///         text.split(',')
///             .map(|s| s.trim().to_lowercase())
///             .filter(|s| !s.is_empty())
///             .collect()
///     }
///
///     fn name(&self) -> &'static str {
///         "comma"
///     }
/// }
///
/// assert_eq!(CommaTokenizer.tokenize("Orc, Goblin"), vec!["orc", "goblin"]);
/// ```
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text, in order of appearance.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Get the name of this tokenizer (used for debugging and status).
    fn name(&self) -> &'static str;
}
