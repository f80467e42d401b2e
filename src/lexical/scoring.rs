//! Lexical scoring strategies for hybrid fusion.

use serde::{Deserialize, Serialize};

use crate::analysis::keywords::{KeywordWeights, expand_compounds};
use crate::lexical::bm25::Bm25Index;

/// How the lexical half of fusion is computed, chosen per search call.
///
/// # Examples
///
/// ```
/// use lorekeeper::analysis::keywords::KeywordWeights;
/// use lorekeeper::lexical::scoring::LexicalScoring;
///
/// let joint = LexicalScoring::Joint;
/// assert!(joint.uses_candidate_pruning());
///
/// let weights = KeywordWeights::from_pairs([("fireball", 5.0)]).unwrap();
/// let weighted = LexicalScoring::weighted(weights);
/// assert!(!weighted.uses_candidate_pruning());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LexicalScoring {
    /// One BM25 score over the whole query token list.
    #[default]
    Joint,
    /// Weighted sum of single-token BM25 scores.
    Weighted {
        /// Per-token weights; unseen tokens weigh 1.0.
        weights: KeywordWeights,
        /// Append adjacent-pair compounds found in the corpus before scoring.
        #[serde(default)]
        expand_compounds: bool,
    },
}

impl LexicalScoring {
    /// Weighted scoring without compound expansion.
    pub fn weighted(weights: KeywordWeights) -> Self {
        LexicalScoring::Weighted {
            weights,
            expand_compounds: false,
        }
    }

    /// Whether the two-stage lexical pruning applies.
    ///
    /// The weighted mode scores every passage directly, so it skips pruning.
    pub fn uses_candidate_pruning(&self) -> bool {
        matches!(self, LexicalScoring::Joint)
    }

    /// Name used in logs and output.
    pub fn name(&self) -> &'static str {
        match self {
            LexicalScoring::Joint => "joint",
            LexicalScoring::Weighted { .. } => "weighted",
        }
    }

    /// Tokens actually scored for the given query tokens.
    pub fn scored_tokens(&self, index: &Bm25Index, query_tokens: &[String]) -> Vec<String> {
        match self {
            LexicalScoring::Weighted {
                expand_compounds: true,
                ..
            } => expand_compounds(query_tokens, |t| index.collection_frequency(t), 1),
            _ => query_tokens.to_vec(),
        }
    }

    /// Per-passage lexical scores in store order.
    pub fn score(&self, index: &Bm25Index, query_tokens: &[String]) -> Vec<f32> {
        match self {
            LexicalScoring::Joint => index.score(query_tokens),
            LexicalScoring::Weighted { weights, .. } => {
                let tokens = self.scored_tokens(index, query_tokens);
                let mut scores = vec![0.0f32; index.doc_count()];
                for token in &tokens {
                    index.add_scores(token, weights.weight(token), &mut scores);
                }
                scores
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::Tokenizer;
    use crate::analysis::tokenizer::regex::RegexTokenizer;
    use crate::lexical::bm25::Bm25Params;

    fn index(texts: &[&str]) -> Bm25Index {
        let tokenizer = RegexTokenizer::default();
        let docs = texts.iter().map(|t| tokenizer.tokenize(t)).collect();
        Bm25Index::from_tokens(docs, Bm25Params::default()).unwrap()
    }

    fn tokens(text: &str) -> Vec<String> {
        RegexTokenizer::default().tokenize(text)
    }

    #[test]
    fn test_unit_weights_equal_joint() {
        let index = index(&["goblin ambush", "dragon hoard", "goblin cave", "tavern", "forest"]);
        let query = tokens("goblin dragon");

        let joint = LexicalScoring::Joint.score(&index, &query);
        let weighted = LexicalScoring::weighted(KeywordWeights::new()).score(&index, &query);

        for (a, b) in joint.iter().zip(weighted.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_weights_reorder_passages() {
        let index = index(&["goblin ambush", "dragon hoard", "tavern", "forest", "river"]);
        let query = tokens("goblin dragon");

        let joint = LexicalScoring::Joint.score(&index, &query);
        assert!((joint[0] - joint[1]).abs() < 1e-6);

        let weights = KeywordWeights::from_pairs([("dragon", 5.0)]).unwrap();
        let weighted = LexicalScoring::weighted(weights).score(&index, &query);
        assert!(weighted[1] > weighted[0]);
        assert!((weighted[1] - 5.0 * joint[1]).abs() < 1e-5);
    }

    #[test]
    fn test_compound_expansion_in_weighted_mode() {
        let index = index(&["she casts fireball", "the fire spreads", "a ball rolls", "quiet inn"]);
        let query = tokens("fire ball");

        let plain = LexicalScoring::weighted(KeywordWeights::new());
        assert_eq!(plain.scored_tokens(&index, &query), vec!["fire", "ball"]);
        assert_eq!(plain.score(&index, &query)[0], 0.0);

        let expanded = LexicalScoring::Weighted {
            weights: KeywordWeights::new(),
            expand_compounds: true,
        };
        assert_eq!(expanded.scored_tokens(&index, &query), vec!["fire", "ball", "fireball"]);
        assert!(expanded.score(&index, &query)[0] > 0.0);
    }

    #[test]
    fn test_serde_tagging() {
        let json = r#"{"mode":"weighted","weights":{"orc":3.0}}"#;
        let scoring: LexicalScoring = serde_json::from_str(json).unwrap();

        assert_eq!(scoring.name(), "weighted");
        assert!(!scoring.uses_candidate_pruning());

        let joint: LexicalScoring = serde_json::from_str(r#"{"mode":"joint"}"#).unwrap();
        assert_eq!(joint, LexicalScoring::Joint);
    }
}
