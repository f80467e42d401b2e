//! Score normalization and fusion.
//!
//! Lexical and vector scores live on different scales, so each full score
//! vector is min-max normalized on its own before the two are blended:
//!
//! ```text
//! norm(s) = (s - min) / (max - min + epsilon)
//! fused   = alpha * norm(lexical) + (1 - alpha) * norm(vector)
//! ```
//!
//! The epsilon keeps a constant score vector from dividing by zero; such a
//! vector normalizes to all zeros.

use std::cmp::Ordering;

use crate::error::{LorekeeperError, Result};

/// Default min-max denominator epsilon.
pub const DEFAULT_EPSILON: f32 = 1e-8;

/// Min-max normalize `scores` into `[0, 1]`.
///
/// # Examples
///
/// ```
/// use lorekeeper::hybrid::scorer::min_max_normalize;
///
/// let normalized = min_max_normalize(&[2.0, 4.0, 3.0], 1e-8);
/// assert!(normalized[0] == 0.0);
/// assert!(normalized[1] > 0.99);
///
/// assert_eq!(min_max_normalize(&[7.0, 7.0], 1e-8), vec![0.0, 0.0]);
/// ```
pub fn min_max_normalize(scores: &[f32], epsilon: f32) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min + epsilon;

    scores.iter().map(|&s| (s - min) / range).collect()
}

/// Normalized and fused scores for every passage, in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedScores {
    /// Blended score per passage.
    pub fused: Vec<f32>,
    /// Normalized lexical score per passage.
    pub lexical: Vec<f32>,
    /// Normalized vector score per passage.
    pub vector: Vec<f32>,
}

impl FusedScores {
    /// Passage positions by descending fused score; ties keep store order.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.fused.len()).collect();
        // Stable sort keeps ascending position among equal scores.
        order.sort_by(|&a, &b| {
            self.fused[b]
                .partial_cmp(&self.fused[a])
                .unwrap_or(Ordering::Equal)
        });
        order
    }

    /// Number of scored passages.
    pub fn len(&self) -> usize {
        self.fused.len()
    }

    /// Whether nothing was scored.
    pub fn is_empty(&self) -> bool {
        self.fused.is_empty()
    }
}

/// Linear blend of normalized lexical and vector scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFuser {
    alpha: f32,
    epsilon: f32,
}

impl ScoreFuser {
    /// Create a fuser; `alpha` weighs the lexical side and must be in `[0, 1]`.
    pub fn new(alpha: f32, epsilon: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(LorekeeperError::invalid_argument(format!(
                "alpha must be in [0, 1], got {alpha}"
            )));
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(LorekeeperError::invalid_argument(format!(
                "epsilon must be positive, got {epsilon}"
            )));
        }
        Ok(Self { alpha, epsilon })
    }

    /// Lexical weight.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Normalize both score vectors and blend them.
    pub fn fuse(&self, lexical: &[f32], vector: &[f32]) -> Result<FusedScores> {
        if lexical.len() != vector.len() {
            return Err(LorekeeperError::invalid_argument(format!(
                "score vectors differ in length: {} lexical, {} vector",
                lexical.len(),
                vector.len()
            )));
        }

        let lexical = min_max_normalize(lexical, self.epsilon);
        let vector = min_max_normalize(vector, self.epsilon);
        let fused = lexical
            .iter()
            .zip(vector.iter())
            .map(|(l, v)| self.alpha * l + (1.0 - self.alpha) * v)
            .collect();

        Ok(FusedScores {
            fused,
            lexical,
            vector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range_and_order() {
        let scores = [3.5, -1.0, 0.0, 12.25, 7.0];
        let normalized = min_max_normalize(&scores, DEFAULT_EPSILON);

        assert!(normalized.iter().all(|&s| (0.0..=1.0).contains(&s)));
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] < scores[j] {
                    assert!(normalized[i] < normalized[j]);
                }
            }
        }
    }

    #[test]
    fn test_constant_scores_normalize_to_zero() {
        let normalized = min_max_normalize(&[0.0, 0.0, 0.0], DEFAULT_EPSILON);
        assert_eq!(normalized, vec![0.0, 0.0, 0.0]);

        let normalized = min_max_normalize(&[5.0], DEFAULT_EPSILON);
        assert_eq!(normalized, vec![0.0]);
        assert!(normalized.iter().all(|s| !s.is_nan()));
    }

    #[test]
    fn test_fusion_extremes() {
        let lexical = [10.0, 0.0, 5.0];
        let vector = [0.0, 0.9, 0.1];

        let lexical_only = ScoreFuser::new(1.0, DEFAULT_EPSILON)
            .unwrap()
            .fuse(&lexical, &vector)
            .unwrap();
        assert_eq!(lexical_only.ranking(), vec![0, 2, 1]);

        let vector_only = ScoreFuser::new(0.0, DEFAULT_EPSILON)
            .unwrap()
            .fuse(&lexical, &vector)
            .unwrap();
        assert_eq!(vector_only.ranking(), vec![1, 2, 0]);
    }

    #[test]
    fn test_lexical_leader_rank_monotonic_in_alpha() {
        let lexical = [1.0, 9.0, 4.0, 8.5, 0.5, 3.0];
        let vector = [0.8, 0.1, 0.7, 0.0, 0.9, 0.2];
        let leader = 1;

        let mut previous_rank = usize::MAX;
        for step in 0..=10 {
            let alpha = step as f32 / 10.0;
            let fused = ScoreFuser::new(alpha, DEFAULT_EPSILON)
                .unwrap()
                .fuse(&lexical, &vector)
                .unwrap();
            let rank = fused.ranking().iter().position(|&i| i == leader).unwrap();
            assert!(rank <= previous_rank, "alpha {alpha}: rank {rank} > {previous_rank}");
            previous_rank = rank;
        }
        assert_eq!(previous_rank, 0);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let fused = ScoreFuser::new(0.5, DEFAULT_EPSILON)
            .unwrap()
            .fuse(&[1.0, 1.0, 1.0], &[0.0, 0.0, 0.0])
            .unwrap();
        assert_eq!(fused.ranking(), vec![0, 1, 2]);
    }

    #[test]
    fn test_invalid_alpha_and_lengths() {
        assert!(matches!(
            ScoreFuser::new(1.5, DEFAULT_EPSILON),
            Err(LorekeeperError::InvalidArgument(_))
        ));
        assert!(ScoreFuser::new(-0.1, DEFAULT_EPSILON).is_err());
        assert!(ScoreFuser::new(f32::NAN, DEFAULT_EPSILON).is_err());

        let fuser = ScoreFuser::new(0.2, DEFAULT_EPSILON).unwrap();
        assert!(fuser.fuse(&[1.0, 2.0], &[1.0]).is_err());
    }
}
