//! SIMD numeric kernels built on the `wide` crate.

use wide::f32x8;

/// Lane count of the SIMD kernels.
const LANES: usize = 8;

/// Inner product of two equal-length slices.
///
/// Slices shorter than one SIMD register fall back to a scalar loop. Callers
/// are responsible for checking lengths; extra elements of the longer slice
/// are ignored.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let (a, b) = (&a[..len], &b[..len]);

    if len < LANES {
        return a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    }

    let mut acc = f32x8::splat(0.0);

    // Process 8 values at a time
    let chunks_a = a.chunks_exact(LANES);
    let chunks_b = b.chunks_exact(LANES);
    let remainder_a = chunks_a.remainder();
    let remainder_b = chunks_b.remainder();

    for (chunk_a, chunk_b) in chunks_a.zip(chunks_b) {
        let mut lane_a = [0.0f32; LANES];
        let mut lane_b = [0.0f32; LANES];
        lane_a.copy_from_slice(chunk_a);
        lane_b.copy_from_slice(chunk_b);
        acc += f32x8::from(lane_a) * f32x8::from(lane_b);
    }

    // Sum all lanes
    let mut total: f32 = acc.to_array().iter().sum();

    // Add remainder
    total += remainder_a
        .iter()
        .zip(remainder_b.iter())
        .map(|(x, y)| x * y)
        .sum::<f32>();

    total
}

/// Sum of squares of a slice (squared L2 norm).
pub fn squared_norm(values: &[f32]) -> f32 {
    dot_product(values, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_short_vectors_use_scalar_path() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        assert_eq!(dot_product(&a, &b), 32.0);
    }

    #[test]
    fn test_simd_matches_scalar_with_remainder() {
        let a: Vec<f32> = (0..37).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..37).map(|i| (i as f32 * 0.11).cos()).collect();

        assert!((dot_product(&a, &b) - scalar_dot(&a, &b)).abs() < 1e-4);
    }

    #[test]
    fn test_squared_norm() {
        let v = vec![3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!((squared_norm(&v) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty() {
        assert_eq!(dot_product(&[], &[]), 0.0);
    }
}
