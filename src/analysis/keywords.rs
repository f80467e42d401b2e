//! Keyword weights and compound keyword expansion.
//!
//! Keyword extraction and weighting are done upstream (typically by a language
//! model). This module validates the weights it hands over and provides the
//! adjacent-pair compound expansion applied before weighted scoring.

use std::collections::HashMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{LorekeeperError, Result};

/// Lowest accepted keyword weight.
pub const MIN_KEYWORD_WEIGHT: f32 = 1.0;

/// Highest accepted keyword weight.
pub const MAX_KEYWORD_WEIGHT: f32 = 5.0;

/// Weight used for tokens with no explicit weight.
pub const DEFAULT_KEYWORD_WEIGHT: f32 = 1.0;

/// Per-token relevance weights in `[1, 5]`.
///
/// Keys are lower-cased on insertion so they line up with tokenizer output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f32>", into = "HashMap<String, f32>")]
pub struct KeywordWeights {
    weights: AHashMap<String, f32>,
}

impl KeywordWeights {
    /// Create an empty weight map; every token weighs the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a weight map, rejecting weights outside `[1, 5]`.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f32)>,
        K: Into<String>,
    {
        let mut weights = Self::new();
        for (token, weight) in pairs {
            weights.insert(token, weight)?;
        }
        Ok(weights)
    }

    /// Set the weight of one token.
    pub fn insert<K: Into<String>>(&mut self, token: K, weight: f32) -> Result<()> {
        let token = token.into();
        if !weight.is_finite() || !(MIN_KEYWORD_WEIGHT..=MAX_KEYWORD_WEIGHT).contains(&weight) {
            return Err(LorekeeperError::invalid_argument(format!(
                "weight for '{token}' must be in [{MIN_KEYWORD_WEIGHT}, {MAX_KEYWORD_WEIGHT}], got {weight}"
            )));
        }
        self.weights.insert(token.to_lowercase(), weight);
        Ok(())
    }

    /// Weight of a token, or the default for unseen tokens.
    pub fn weight(&self, token: &str) -> f32 {
        self.weights
            .get(token)
            .copied()
            .unwrap_or(DEFAULT_KEYWORD_WEIGHT)
    }

    /// Number of explicitly weighted tokens.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no token carries an explicit weight.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl TryFrom<HashMap<String, f32>> for KeywordWeights {
    type Error = LorekeeperError;

    fn try_from(map: HashMap<String, f32>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

impl From<KeywordWeights> for HashMap<String, f32> {
    fn from(weights: KeywordWeights) -> Self {
        weights.weights.into_iter().collect()
    }
}

/// Append compound keywords formed from adjacent token pairs.
///
/// For every adjacent pair `(a, b)` of the original tokens, `a + b` is appended
/// when it occurs in the corpus at least `min_count` times according to
/// `collection_frequency`. Original tokens are kept in place and in order.
///
/// ```
/// use lorekeeper::analysis::keywords::expand_compounds;
///
/// let tokens = vec!["cast".to_string(), "fire".to_string(), "ball".to_string()];
/// let expanded = expand_compounds(&tokens, |t| u64::from(t == "fireball"), 1);
/// assert_eq!(expanded, vec!["cast", "fire", "ball", "fireball"]);
/// ```
pub fn expand_compounds<F>(tokens: &[String], collection_frequency: F, min_count: u64) -> Vec<String>
where
    F: Fn(&str) -> u64,
{
    let mut expanded = tokens.to_vec();
    for pair in tokens.windows(2) {
        let joint = format!("{}{}", pair[0], pair[1]);
        if collection_frequency(&joint) >= min_count.max(1) {
            expanded.push(joint);
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_default_and_lookup() {
        let weights = KeywordWeights::from_pairs([("Fireball", 5.0), ("stairs", 3.0)]).unwrap();

        assert_eq!(weights.len(), 2);
        assert_eq!(weights.weight("fireball"), 5.0);
        assert_eq!(weights.weight("stairs"), 3.0);
        assert_eq!(weights.weight("goblin"), DEFAULT_KEYWORD_WEIGHT);
    }

    #[test]
    fn test_weights_out_of_range_rejected() {
        assert!(KeywordWeights::from_pairs([("dragon", 0.5)]).is_err());
        assert!(KeywordWeights::from_pairs([("dragon", 6.0)]).is_err());
        assert!(KeywordWeights::from_pairs([("dragon", f32::NAN)]).is_err());
        assert!(KeywordWeights::from_pairs([("dragon", 1.0), ("orc", 5.0)]).is_ok());
    }

    #[test]
    fn test_weights_deserialize_validates() {
        let ok: KeywordWeights = serde_json::from_str(r#"{"Dragon": 4}"#).unwrap();
        assert_eq!(ok.weight("dragon"), 4.0);

        let bad = serde_json::from_str::<KeywordWeights>(r#"{"dragon": 9}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_expand_compounds_respects_min_count() {
        let tokens: Vec<String> = ["magic", "missile", "hits"].iter().map(|s| s.to_string()).collect();
        let frequency = |t: &str| match t {
            "magicmissile" => 2,
            "missilehits" => 1,
            _ => 0,
        };

        let expanded = expand_compounds(&tokens, frequency, 2);
        assert_eq!(expanded, vec!["magic", "missile", "hits", "magicmissile"]);

        let expanded = expand_compounds(&tokens, frequency, 1);
        assert_eq!(expanded.len(), 5);
    }

    #[test]
    fn test_expand_compounds_single_token() {
        let tokens = vec!["goblin".to_string()];
        assert_eq!(expand_compounds(&tokens, |_| 10, 1), tokens);
    }
}
