//! Additive masking for aggregation inputs.
//!
//! Simulation-grade stand-in for secure aggregation. Pairwise masks cancel
//! exactly in the sum, so the aggregate is unchanged while any single masked
//! vector reveals nothing about its participant's raw values.
//!
//! This is NOT a cryptographic protocol: masks are generated centrally and
//! cancellation requires every masked vector to reach the aggregator (no
//! dropout tolerance, no key agreement). Treat it as a placeholder with the
//! shape of secure aggregation, not the guarantees.

use crate::core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Pairwise additive masking over a set of update vectors.
pub struct PairwiseMasking {
    /// Random source for mask generation
    rng: Mutex<StdRng>,
    /// Magnitude of the uniform masks
    mask_scale: f32,
}

impl PairwiseMasking {
    /// Create a new masker with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create with a fixed seed for reproducible masks.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            mask_scale: 1.0,
        }
    }

    /// Set the mask magnitude.
    pub fn with_mask_scale(mut self, scale: f32) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "mask scale must be positive, got {}",
                scale
            )));
        }
        self.mask_scale = scale;
        Ok(self)
    }

    /// Mask a set of equally-shaped vectors.
    ///
    /// For every pair (i, j) with i < j, one mask vector is added to i and
    /// subtracted from j, so the element-wise sum over all vectors is
    /// preserved. Vectors of unequal length are masked up to the shortest
    /// length in each pair.
    pub fn mask(&self, vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let mut masked: Vec<Vec<f32>> = vectors.to_vec();
        let mut rng = self.rng.lock().unwrap();

        for i in 0..masked.len() {
            for j in (i + 1)..masked.len() {
                let len = masked[i].len().min(masked[j].len());
                for k in 0..len {
                    let m = rng.gen_range(-self.mask_scale..self.mask_scale);
                    masked[i][k] += m;
                    masked[j][k] -= m;
                }
            }
        }

        masked
    }
}

impl Default for PairwiseMasking {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_preserved() {
        let masker = PairwiseMasking::with_seed(11);
        let vectors = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];

        let masked = masker.mask(&vectors);

        for k in 0..3 {
            let before: f32 = vectors.iter().map(|v| v[k]).sum();
            let after: f32 = masked.iter().map(|v| v[k]).sum();
            assert!((before - after).abs() < 1e-4);
        }
    }

    #[test]
    fn test_individual_vectors_change() {
        let masker = PairwiseMasking::with_seed(11);
        let vectors = vec![vec![1.0; 8], vec![2.0; 8]];

        let masked = masker.mask(&vectors);

        assert!(masked[0].iter().any(|v| (v - 1.0).abs() > 1e-6));
        assert!(masked[1].iter().any(|v| (v - 2.0).abs() > 1e-6));
    }

    #[test]
    fn test_rejects_nonpositive_scale() {
        assert!(PairwiseMasking::with_seed(1).with_mask_scale(0.0).is_err());
        assert!(PairwiseMasking::with_seed(1).with_mask_scale(-1.0).is_err());
    }

    #[test]
    fn test_single_vector_unchanged() {
        let masker = PairwiseMasking::with_seed(11);
        let vectors = vec![vec![1.0, 2.0]];

        let masked = masker.mask(&vectors);
        assert_eq!(masked[0], vectors[0]);
    }
}
