//! BM25 (Okapi) index over a passage store.
//!
//! The index keeps postings (`term -> [(passage, tf)]`) plus per-passage
//! lengths, so scoring a query touches only the postings of its tokens. IDF
//! follows the Okapi definition, with negative IDFs (terms present in more than
//! half the corpus) floored to `epsilon * average_idf`.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::tokenizer::Tokenizer;
use crate::error::{LorekeeperError, Result};
use crate::passage::store::PassageStore;

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// K1 parameter (term frequency saturation).
    pub k1: f32,
    /// B parameter (document length normalization).
    pub b: f32,
    /// Fraction of the average IDF used as the floor for negative IDFs.
    pub epsilon: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl Bm25Params {
    /// Reject parameters outside their meaningful ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(LorekeeperError::invalid_config(format!(
                "bm25.k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(LorekeeperError::invalid_config(format!(
                "bm25.b must be in [0, 1], got {}",
                self.b
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(LorekeeperError::invalid_config(format!(
                "bm25.epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// One posting: a passage position and the term frequency inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Posting {
    doc: u32,
    tf: u32,
}

/// Per-term postings and IDF.
#[derive(Debug, Clone)]
struct TermEntry {
    idf: f32,
    postings: Vec<Posting>,
}

/// BM25 index whose position `i` always corresponds to passage `i`.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    terms: AHashMap<String, TermEntry>,
    doc_lengths: Vec<u32>,
    avg_doc_len: f32,
}

impl Bm25Index {
    /// Build the index by tokenizing every passage with `tokenizer`.
    pub fn build(store: &PassageStore, tokenizer: &dyn Tokenizer, params: Bm25Params) -> Result<Self> {
        let documents: Vec<Vec<String>> = store
            .as_slice()
            .par_iter()
            .map(|passage| tokenizer.tokenize(&passage.text))
            .collect();
        Self::from_tokens(documents, params)
    }

    /// Build the index from already tokenized documents.
    ///
    /// This is the entry point for callers that lemmatize or otherwise
    /// preprocess tokens before indexing.
    pub fn from_tokens(documents: Vec<Vec<String>>, params: Bm25Params) -> Result<Self> {
        if documents.is_empty() {
            return Err(LorekeeperError::EmptyCorpus);
        }
        params.validate()?;
        if documents.len() > u32::MAX as usize {
            return Err(LorekeeperError::invalid_argument(
                "passage count exceeds the index position range",
            ));
        }

        let frequencies: Vec<AHashMap<String, u32>> = documents
            .par_iter()
            .map(|tokens| {
                let mut counts = AHashMap::with_capacity(tokens.len());
                for token in tokens {
                    *counts.entry(token.clone()).or_insert(0u32) += 1;
                }
                counts
            })
            .collect();

        let doc_lengths: Vec<u32> = documents.iter().map(|t| t.len() as u32).collect();
        let total_len: u64 = doc_lengths.iter().map(|&l| u64::from(l)).sum();
        let doc_count = documents.len();
        let avg_doc_len = total_len as f32 / doc_count as f32;

        // Merge in passage order so every postings list is sorted by position.
        let mut postings: AHashMap<String, Vec<Posting>> = AHashMap::new();
        for (doc, counts) in frequencies.into_iter().enumerate() {
            for (term, tf) in counts {
                postings.entry(term).or_default().push(Posting {
                    doc: doc as u32,
                    tf,
                });
            }
        }
        for list in postings.values_mut() {
            list.sort_unstable_by_key(|p| p.doc);
        }

        let terms = Self::compute_idf(postings, doc_count, params.epsilon);

        debug!(
            passages = doc_count,
            vocabulary = terms.len(),
            avg_doc_len,
            "built bm25 index"
        );

        Ok(Self {
            params,
            terms,
            doc_lengths,
            avg_doc_len,
        })
    }

    fn compute_idf(
        postings: AHashMap<String, Vec<Posting>>,
        doc_count: usize,
        epsilon: f32,
    ) -> AHashMap<String, TermEntry> {
        let n = doc_count as f32;
        let mut idf_sum = 0.0f32;
        let mut terms: AHashMap<String, TermEntry> = postings
            .into_iter()
            .map(|(term, postings)| {
                let df = postings.len() as f32;
                let idf = (n - df + 0.5).ln() - (df + 0.5).ln();
                idf_sum += idf;
                (term, TermEntry { idf, postings })
            })
            .collect();

        if terms.is_empty() {
            return terms;
        }

        // A negative floor would rank matching passages below non-matching ones.
        let average_idf = idf_sum / terms.len() as f32;
        let floor = (epsilon * average_idf).max(0.0);
        for entry in terms.values_mut() {
            if entry.idf < 0.0 {
                entry.idf = floor;
            }
        }
        terms
    }

    /// Score a token list against every passage, in store order.
    ///
    /// Repeated tokens contribute once per occurrence; tokens absent from the
    /// corpus contribute nothing.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lengths.len()];
        for token in query_tokens {
            self.add_scores(token, 1.0, &mut scores);
        }
        scores
    }

    /// Score a single token against every passage, in store order.
    pub fn score_token(&self, token: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lengths.len()];
        self.add_scores(token, 1.0, &mut scores);
        scores
    }

    /// Add `weight * bm25(token, passage)` into `scores` for every passage.
    ///
    /// `scores` must hold exactly one slot per indexed passage.
    pub fn accumulate(&self, token: &str, weight: f32, scores: &mut [f32]) -> Result<()> {
        if scores.len() != self.doc_lengths.len() {
            return Err(LorekeeperError::invalid_argument(format!(
                "score buffer holds {} slots for {} passages",
                scores.len(),
                self.doc_lengths.len()
            )));
        }
        self.add_scores(token, weight, scores);
        Ok(())
    }

    /// [`Bm25Index::accumulate`] for buffers sized by this index.
    pub(crate) fn add_scores(&self, token: &str, weight: f32, scores: &mut [f32]) {
        let Some(entry) = self.terms.get(token) else {
            return;
        };
        let k1 = self.params.k1;
        let b = self.params.b;
        let avg_len = if self.avg_doc_len > 0.0 {
            self.avg_doc_len
        } else {
            1.0
        };

        for posting in &entry.postings {
            let tf = posting.tf as f32;
            let doc_len = self.doc_lengths[posting.doc as usize] as f32;
            let tf_component = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * (doc_len / avg_len)));
            scores[posting.doc as usize] += weight * entry.idf * tf_component;
        }
    }

    /// Inverse document frequency of a term, if it occurs in the corpus.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.terms.get(term).map(|e| e.idf)
    }

    /// Number of passages containing the term.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, |e| e.postings.len())
    }

    /// Total occurrences of the term across the corpus.
    pub fn collection_frequency(&self, term: &str) -> u64 {
        self.terms
            .get(term)
            .map_or(0, |e| e.postings.iter().map(|p| u64::from(p.tf)).sum())
    }

    /// Number of indexed passages.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Token count of one passage.
    pub fn doc_len(&self, doc: usize) -> Option<usize> {
        self.doc_lengths.get(doc).map(|&l| l as usize)
    }

    /// Average passage length in tokens.
    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    /// Number of distinct terms.
    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    /// Parameters the index scores with.
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tokenizer::regex::RegexTokenizer;
    use crate::passage::store::Passage;

    fn tokens(text: &str) -> Vec<String> {
        RegexTokenizer::default().tokenize(text)
    }

    fn build(texts: &[&str]) -> Bm25Index {
        let store = PassageStore::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Passage::new(format!("p{i}"), *t, "combat"))
                .collect(),
        );
        Bm25Index::build(&store, &RegexTokenizer::default(), Bm25Params::default()).unwrap()
    }

    #[test]
    fn test_empty_corpus_rejected() {
        let err = Bm25Index::from_tokens(Vec::new(), Bm25Params::default()).unwrap_err();
        assert!(matches!(err, LorekeeperError::EmptyCorpus));
    }

    #[test]
    fn test_scores_follow_store_order() {
        let index = build(&[
            "the goblin attacks the party",
            "a dragon sleeps on gold",
            "the party rests at the inn",
            "wolves howl in the forest",
        ]);

        let scores = index.score(&tokens("dragon"));
        assert_eq!(scores.len(), 4);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 0.0);
        assert_eq!(scores[3], 0.0);
    }

    #[test]
    fn test_absent_token_contributes_zero() {
        let index = build(&["goblin ambush", "dragon lair", "quiet village"]);

        let with_unknown = index.score(&tokens("goblin beholder"));
        let without = index.score(&tokens("goblin"));
        assert_eq!(with_unknown, without);
        assert!(index.score(&tokens("beholder")).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_okapi_idf_values() {
        let index = build(&["goblin", "dragon", "orc", "troll", "goblin orc"]);

        // df = 1 of 5: ln(4.5 / 1.5)
        let expected = (4.5f32 / 1.5).ln();
        assert!((index.idf("dragon").unwrap() - expected).abs() < 1e-6);
        assert!(index.idf("beholder").is_none());
        assert_eq!(index.document_frequency("goblin"), 2);
    }

    #[test]
    fn test_negative_idf_floored() {
        // "the" appears in 3 of 4 passages: ln(1.5 / 3.5) < 0.
        let index = build(&["the goblin", "the dragon", "the orc", "wolves"]);

        let idf_the = index.idf("the").unwrap();
        assert!(idf_the >= 0.0);
        assert!(idf_the < index.idf("goblin").unwrap());
    }

    #[test]
    fn test_repeated_query_tokens_accumulate() {
        let index = build(&["goblin ambush", "dragon lair", "quiet village"]);

        let once = index.score(&tokens("goblin"));
        let twice = index.score(&tokens("goblin goblin"));
        assert!((twice[0] - 2.0 * once[0]).abs() < 1e-6);
    }

    #[test]
    fn test_term_frequency_saturates_and_length_normalizes() {
        let index = build(&[
            "goblin",
            "goblin goblin goblin",
            "goblin and many other words in a long passage",
            "dragon",
            "orc",
        ]);

        let scores = index.score(&tokens("goblin"));
        assert!(scores[1] > scores[0]);
        assert!(scores[1] < 3.0 * scores[0]);
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn test_joint_equals_sum_of_single_tokens() {
        let index = build(&["goblin ambush road", "dragon lair gold", "goblin gold", "inn"]);

        let joint = index.score(&tokens("goblin gold"));
        let a = index.score_token("goblin");
        let b = index.score_token("gold");
        for i in 0..joint.len() {
            assert!((joint[i] - (a[i] + b[i])).abs() < 1e-6);
        }
    }

    #[test]
    fn test_statistics() {
        let index = build(&["fire ball fire", "ice storm"]);

        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.doc_len(0), Some(3));
        assert_eq!(index.collection_frequency("fire"), 2);
        assert_eq!(index.collection_frequency("fireball"), 0);
        assert_eq!(index.vocabulary_len(), 4);
        assert!((index.avg_doc_len() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = Bm25Params {
            b: 1.5,
            ..Default::default()
        };
        assert!(Bm25Index::from_tokens(vec![tokens("goblin")], params).is_err());
    }

    #[test]
    fn test_empty_passages_do_not_produce_nan() {
        let index = Bm25Index::from_tokens(vec![Vec::new(), Vec::new()], Bm25Params::default()).unwrap();
        let scores = index.score(&tokens("goblin"));
        assert!(scores.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_accumulate_checks_buffer_length() {
        let index = build(&["goblin ambush", "dragon hoard", "quiet tavern"]);

        let mut short = vec![0.0f32; 2];
        let err = index.accumulate("goblin", 1.0, &mut short).unwrap_err();
        assert!(matches!(err, LorekeeperError::InvalidArgument(_)));
        assert!(short.iter().all(|s| *s == 0.0));

        let mut scores = vec![0.0f32; index.doc_count()];
        index.accumulate("goblin", 2.0, &mut scores).unwrap();
        let single = index.score_token("goblin");
        assert!((scores[0] - 2.0 * single[0]).abs() < 1e-6);
        assert_eq!(scores[1], 0.0);
    }
}
