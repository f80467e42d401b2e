//! Regex-based tokenizer implementation.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::Tokenizer;
use crate::error::{LorekeeperError, Result};

/// Default token pattern: runs of word characters.
pub const DEFAULT_PATTERN: &str = r"\w+";

lazy_static! {
    static ref WORD_PATTERN: Arc<Regex> =
        Arc::new(Regex::new(DEFAULT_PATTERN).expect("Default regex pattern should be valid"));
}

/// A tokenizer that lower-cases text and extracts regex matches.
///
/// With the default pattern `\w+` this splits on every non-word character, so
/// punctuation and hyphens never survive into tokens. No stemming is applied.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a new regex tokenizer with the default `\w+` pattern.
    pub fn new() -> Result<Self> {
        Ok(Self::default())
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| LorekeeperError::invalid_config(format!("Invalid regex pattern: {e}")))?;

        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        RegexTokenizer {
            pattern: Arc::clone(&WORD_PATTERN),
        }
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_tokenizer() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("The Goblin's scimitar, hits!");

        assert_eq!(tokens, vec!["the", "goblin", "s", "scimitar", "hits"]);
    }

    #[test]
    fn test_unicode_is_case_folded() {
        let tokenizer = RegexTokenizer::default();
        assert_eq!(tokenizer.tokenize("ÉLAN Vital"), vec!["élan", "vital"]);
    }

    #[test]
    fn test_digits_and_underscores_are_word_characters() {
        let tokenizer = RegexTokenizer::default();
        assert_eq!(tokenizer.tokenize("d20 rolls hit_points"), vec!["d20", "rolls", "hit_points"]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        let tokenizer = RegexTokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("?!... --").is_empty());
    }

    #[test]
    fn test_custom_pattern() {
        let tokenizer = RegexTokenizer::with_pattern(r"[a-z]+").unwrap();
        assert_eq!(tokenizer.pattern(), "[a-z]+");
        assert_eq!(tokenizer.tokenize("d20 Rolls"), vec!["d", "rolls"]);

        assert!(RegexTokenizer::with_pattern("[unclosed").is_err());
    }
}
