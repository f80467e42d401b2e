//! Flat (exact) inner-product index.
//!
//! Vectors are stored contiguously in passage order. Both search forms compute
//! inner products directly against the stored rows, so a subset search over an
//! arbitrary candidate list needs no per-call index construction.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LorekeeperError, Result};
use crate::util::simd;
use crate::vector::core::vector::Vector;

/// Candidate count above which scoring runs on the rayon pool.
const PARALLEL_THRESHOLD: usize = 2048;

/// One vector search hit: a passage position and its inner-product score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Passage position in the store.
    pub index: usize,
    /// Inner product with the query (cosine similarity for unit vectors).
    pub score: f32,
}

/// Exact inner-product index whose row `i` corresponds to passage `i`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
    len: usize,
}

impl FlatIndex {
    /// Build an index from unit-normalized vectors in passage order.
    ///
    /// Every vector must be finite, share one dimension and have unit norm.
    pub fn new(vectors: Vec<Vector>) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Err(LorekeeperError::EmptyCorpus);
        };
        let dimension = first.dimension();
        if dimension == 0 {
            return Err(LorekeeperError::vector("vectors must have at least one dimension"));
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (i, vector) in vectors.iter().enumerate() {
            vector
                .validate_dimension(dimension)
                .map_err(|e| LorekeeperError::vector(format!("vector {i}: {e}")))?;
            Self::check_unit(vector).map_err(|e| LorekeeperError::vector(format!("vector {i}: {e}")))?;
            data.extend_from_slice(&vector.data);
        }

        Ok(Self {
            dimension,
            data,
            len: vectors.len(),
        })
    }

    fn check_unit(vector: &Vector) -> Result<()> {
        if !vector.is_valid() {
            return Err(LorekeeperError::vector("contains NaN or infinite values"));
        }
        if !vector.is_unit() {
            return Err(LorekeeperError::vector(format!(
                "expected unit L2 norm, got {}",
                vector.norm()
            )));
        }
        Ok(())
    }

    fn check_query(&self, query: &Vector) -> Result<()> {
        query.validate_dimension(self.dimension)?;
        Self::check_unit(query).map_err(|e| LorekeeperError::vector(format!("query: {e}")))
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index stores no vectors.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the stored row for passage `index`.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    fn score_row(&self, query: &[f32], index: usize) -> VectorHit {
        let start = index * self.dimension;
        VectorHit {
            index,
            score: simd::dot_product(query, &self.data[start..start + self.dimension]),
        }
    }

    /// Top-`k` passages over the whole index.
    pub fn full_search(&self, query: &Vector, k: usize) -> Result<Vec<VectorHit>> {
        self.check_query(query)?;

        let hits: Vec<VectorHit> = if self.len > PARALLEL_THRESHOLD {
            (0..self.len)
                .into_par_iter()
                .map(|i| self.score_row(&query.data, i))
                .collect()
        } else {
            (0..self.len).map(|i| self.score_row(&query.data, i)).collect()
        };

        Ok(top_k(hits, k))
    }

    /// Top-`k` passages among `candidates` only.
    ///
    /// Candidates are passage positions and are expected to be distinct; the
    /// order they are given in does not affect the result.
    pub fn subset_search(&self, query: &Vector, candidates: &[usize], k: usize) -> Result<Vec<VectorHit>> {
        self.check_query(query)?;
        if let Some(&bad) = candidates.iter().find(|&&i| i >= self.len) {
            return Err(LorekeeperError::invalid_argument(format!(
                "candidate {bad} is out of range for {} vectors",
                self.len
            )));
        }

        let hits: Vec<VectorHit> = if candidates.len() > PARALLEL_THRESHOLD {
            candidates
                .par_iter()
                .map(|&i| self.score_row(&query.data, i))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&i| self.score_row(&query.data, i))
                .collect()
        };

        Ok(top_k(hits, k))
    }
}

/// Descending score, ties by ascending passage position.
fn rank_order(a: &VectorHit, b: &VectorHit) -> Ordering {
    b.score.total_cmp(&a.score).then(a.index.cmp(&b.index))
}

fn top_k(mut hits: Vec<VectorHit>, k: usize) -> Vec<VectorHit> {
    if k == 0 {
        return Vec::new();
    }
    if k < hits.len() {
        hits.select_nth_unstable_by(k - 1, rank_order);
        hits.truncate(k);
    }
    hits.sort_by(rank_order);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(data: &[f32]) -> Vector {
        Vector::new(data.to_vec()).normalized()
    }

    fn sample_index() -> FlatIndex {
        FlatIndex::new(vec![
            unit(&[1.0, 0.0, 0.0]),
            unit(&[0.0, 1.0, 0.0]),
            unit(&[0.0, 0.0, 1.0]),
            unit(&[1.0, 1.0, 0.0]),
            unit(&[1.0, 0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_search_orders_by_inner_product() {
        let index = sample_index();
        let hits = index.full_search(&unit(&[1.0, 0.2, 0.0]), 3).unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 3);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_subset_search_only_returns_candidates() {
        let index = sample_index();
        let hits = index
            .subset_search(&unit(&[1.0, 0.0, 0.0]), &[1, 2, 4], 2)
            .unwrap();

        let ids: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(ids[0], 4);
        assert!(ids.iter().all(|i| [1, 2, 4].contains(i)));
    }

    #[test]
    fn test_subset_over_everything_equals_full_search() {
        let index = sample_index();
        let query = unit(&[0.3, 0.5, 0.8]);

        let full = index.full_search(&query, 5).unwrap();
        let subset = index.subset_search(&query, &[4, 2, 0, 3, 1], 5).unwrap();
        assert_eq!(full, subset);
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = FlatIndex::new(vec![
            unit(&[0.0, 1.0]),
            unit(&[1.0, 0.0]),
            unit(&[1.0, 0.0]),
        ])
        .unwrap();

        let hits = index.subset_search(&unit(&[1.0, 0.0]), &[2, 1, 0], 2).unwrap();
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 2);
    }

    #[test]
    fn test_k_larger_than_index_and_zero() {
        let index = sample_index();
        let query = unit(&[1.0, 0.0, 0.0]);

        assert_eq!(index.full_search(&query, 50).unwrap().len(), 5);
        assert!(index.full_search(&query, 0).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_unit_vectors() {
        let err = FlatIndex::new(vec![Vector::new(vec![3.0, 4.0])]).unwrap_err();
        assert!(matches!(err, LorekeeperError::Vector(_)));

        let index = sample_index();
        assert!(index.full_search(&Vector::new(vec![2.0, 0.0, 0.0]), 1).is_err());
        assert!(index.full_search(&Vector::new(vec![0.0, 0.0, 0.0]), 1).is_err());
    }

    #[test]
    fn test_rejects_mixed_dimensions_and_empty() {
        let err = FlatIndex::new(vec![unit(&[1.0, 0.0]), unit(&[1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, LorekeeperError::Vector(_)));

        let err = FlatIndex::new(Vec::new()).unwrap_err();
        assert!(matches!(err, LorekeeperError::EmptyCorpus));

        let index = sample_index();
        assert!(index.full_search(&unit(&[1.0, 0.0]), 1).is_err());
    }

    #[test]
    fn test_out_of_range_candidate() {
        let index = sample_index();
        let err = index.subset_search(&unit(&[1.0, 0.0, 0.0]), &[0, 9], 1).unwrap_err();
        assert!(matches!(err, LorekeeperError::InvalidArgument(_)));
    }

    #[test]
    fn test_row_access() {
        let index = sample_index();
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 5);
        assert_eq!(index.row(2), Some(&[0.0f32, 0.0, 1.0][..]));
        assert!(index.row(5).is_none());
    }
}
