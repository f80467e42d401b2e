//! Lexical candidate pruning.
//!
//! Inner-product search is the expensive half of a query, so it runs only
//! over the `candidate_cap` passages with the highest lexical scores and
//! keeps the `rerank_cap` best of those. Passages outside the re-ranked set
//! get a vector score of zero during fusion.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::Result;
use crate::hybrid::config::RetrieverConfig;
use crate::vector::core::vector::Vector;
use crate::vector::index::flat::{FlatIndex, VectorHit};

/// Outcome of candidate generation for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePool {
    /// Candidate positions in lexical order.
    indices: Vec<usize>,
    /// Membership flag per passage position.
    members: Vec<bool>,
    /// Re-ranked hits, best first.
    hits: Vec<VectorHit>,
}

impl CandidatePool {
    fn new(corpus_len: usize, indices: Vec<usize>, hits: Vec<VectorHit>) -> Self {
        let mut members = vec![false; corpus_len];
        for &i in &indices {
            members[i] = true;
        }
        Self {
            indices,
            members,
            hits,
        }
    }

    /// Candidate positions in lexical order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Re-ranked vector hits, best first.
    pub fn hits(&self) -> &[VectorHit] {
        &self.hits
    }

    /// Pool size.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether passage `index` is in the pool.
    pub fn contains(&self, index: usize) -> bool {
        self.members.get(index).copied().unwrap_or(false)
    }

    /// Raw inner product of passage `index`, if it was re-ranked.
    pub fn vector_score(&self, index: usize) -> Option<f32> {
        self.hits.iter().find(|h| h.index == index).map(|h| h.score)
    }

    /// Vector score per passage in store order, zero outside the re-rank.
    pub fn dense_vector_scores(&self) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.members.len()];
        for hit in &self.hits {
            scores[hit.index] = hit.score;
        }
        scores
    }
}

/// Selects candidates lexically and re-ranks them by inner product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateGenerator {
    candidate_cap: usize,
    rerank_cap: usize,
}

impl CandidateGenerator {
    /// Create a generator with explicit caps.
    pub fn new(candidate_cap: usize, rerank_cap: usize) -> Self {
        Self {
            candidate_cap,
            rerank_cap,
        }
    }

    /// Create a generator from the retriever configuration.
    pub fn from_config(config: &RetrieverConfig) -> Self {
        Self::new(config.candidate_cap, config.rerank_cap)
    }

    /// Positions of the `candidate_cap` highest lexical scores.
    ///
    /// Ordered by descending score, ties by ascending position. A corpus
    /// smaller than the cap yields every position.
    pub fn top_lexical(&self, lexical: &[f32]) -> Vec<usize> {
        let order = |a: &usize, b: &usize| -> Ordering {
            lexical[*b]
                .partial_cmp(&lexical[*a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(b))
        };

        if self.candidate_cap == 0 {
            return Vec::new();
        }
        let mut positions: Vec<usize> = (0..lexical.len()).collect();
        if self.candidate_cap < positions.len() {
            positions.select_nth_unstable_by(self.candidate_cap - 1, order);
            positions.truncate(self.candidate_cap);
        }
        positions.sort_by(order);
        positions
    }

    /// Two-stage pruning: lexical top-N, then inner-product top-M among them.
    pub fn generate(&self, lexical: &[f32], query: &Vector, index: &FlatIndex) -> Result<CandidatePool> {
        let candidates = self.top_lexical(lexical);
        let hits = index.subset_search(query, &candidates, self.rerank_cap)?;
        debug!(
            candidates = candidates.len(),
            reranked = hits.len(),
            "generated lexical candidates"
        );
        Ok(CandidatePool::new(lexical.len(), candidates, hits))
    }

    /// No pruning: every passage is a candidate and the vector half comes
    /// from a full search.
    pub fn exhaustive(&self, query: &Vector, index: &FlatIndex) -> Result<CandidatePool> {
        let hits = index.full_search(query, self.rerank_cap)?;
        let candidates = (0..index.len()).collect();
        Ok(CandidatePool::new(index.len(), candidates, hits))
    }
}
