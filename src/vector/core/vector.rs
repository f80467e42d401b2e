//! Core vector data structure.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LorekeeperError, Result};
use crate::util::simd;

/// Tolerance on `|norm - 1|` for a vector to count as unit length.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

/// A dense vector representation for similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The vector dimensions as floating point values.
    pub data: Vec<f32>,
}

impl Vector {
    /// Create a new vector with the given dimensions.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this vector.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Calculate the L2 norm (magnitude) of this vector.
    pub fn norm(&self) -> f32 {
        simd::squared_norm(&self.data).sqrt()
    }

    /// Normalize this vector to unit length.
    ///
    /// A zero vector is left untouched; [`Vector::is_unit`] reports it.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this vector.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Whether the vector has unit L2 norm within [`UNIT_NORM_TOLERANCE`].
    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() <= UNIT_NORM_TOLERANCE
    }

    /// Inner product with another vector of the same dimension.
    pub fn dot(&self, other: &Vector) -> Result<f32> {
        other.validate_dimension(self.dimension())?;
        Ok(simd::dot_product(&self.data, &other.data))
    }

    /// Validate that this vector has the expected dimension.
    pub fn validate_dimension(&self, expected_dim: usize) -> Result<()> {
        if self.data.len() != expected_dim {
            return Err(LorekeeperError::vector(format!(
                "dimension mismatch: expected {}, got {}",
                expected_dim,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Check if this vector contains any NaN or infinite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Normalize multiple vectors in parallel.
    pub fn normalize_batch_parallel(vectors: &mut [Vector]) {
        if vectors.len() > 10 {
            vectors.par_iter_mut().for_each(|vector| vector.normalize());
        } else {
            for vector in vectors {
                vector.normalize();
            }
        }
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
