//! Differential privacy noise injection.
//!
//! Calibrated Laplace and Gaussian perturbation of parameter vectors.

use crate::core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::sync::Mutex;

/// Noise injector parameterized by a privacy budget.
///
/// Smaller `epsilon` means more noise and stronger privacy. `delta` is only
/// used by the Gaussian mechanism. Both mechanisms are pure transforms over
/// the input vector; the injector holds no state besides its random source.
pub struct NoiseInjector {
    /// Privacy loss budget (must be positive)
    epsilon: f32,
    /// Failure probability for the Gaussian mechanism
    delta: f32,
    /// Random source, seedable for reproducible tests
    rng: Mutex<StdRng>,
}

impl NoiseInjector {
    /// Create a new injector with an entropy-seeded random source.
    pub fn new(epsilon: f32, delta: f32) -> Result<Self> {
        Self::from_rng(epsilon, delta, StdRng::from_entropy())
    }

    /// Create with a fixed seed for reproducible noise.
    pub fn with_seed(epsilon: f32, delta: f32, seed: u64) -> Result<Self> {
        Self::from_rng(epsilon, delta, StdRng::seed_from_u64(seed))
    }

    fn from_rng(epsilon: f32, delta: f32, rng: StdRng) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidPrivacyBudget(epsilon));
        }
        if !delta.is_finite() || delta <= 0.0 || delta >= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "delta must be in (0, 1), got {}",
                delta
            )));
        }
        Ok(Self {
            epsilon,
            delta,
            rng: Mutex::new(rng),
        })
    }

    /// Privacy loss budget.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Failure probability.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Add i.i.d. Laplace noise with scale `sensitivity / epsilon`.
    pub fn add_laplace_noise(&self, values: &[f32], sensitivity: f32) -> Vec<f32> {
        let scale = sensitivity / self.epsilon;
        let mut rng = self.rng.lock().unwrap();

        values
            .iter()
            .map(|v| {
                // Inverse-CDF sampling from Laplace(0, scale)
                let u: f32 = rng.gen::<f32>() - 0.5;
                v - scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
            })
            .collect()
    }

    /// Add i.i.d. zero-mean Gaussian noise calibrated for (epsilon, delta)-DP.
    ///
    /// Standard deviation is `sensitivity * sqrt(2 * ln(1.25 / delta)) / epsilon`.
    pub fn add_gaussian_noise(&self, values: &[f32], sensitivity: f32) -> Vec<f32> {
        let sigma = sensitivity * (2.0 * (1.25 / self.delta).ln()).sqrt() / self.epsilon;
        let mut rng = self.rng.lock().unwrap();

        values
            .iter()
            .map(|v| {
                let z: f32 = rng.sample(StandardNormal);
                v + sigma * z
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_nonpositive_epsilon() {
        assert!(NoiseInjector::new(0.0, 1e-5).is_err());
        assert!(NoiseInjector::new(-1.0, 1e-5).is_err());
    }

    #[test]
    fn test_rejects_invalid_delta() {
        assert!(NoiseInjector::new(1.0, 0.0).is_err());
        assert!(NoiseInjector::new(1.0, 1.0).is_err());
    }

    #[test]
    fn test_laplace_perturbs_values() {
        let injector = NoiseInjector::with_seed(1.0, 1e-5, 7).unwrap();
        let values = vec![1.0; 16];
        let noisy = injector.add_laplace_noise(&values, 1.0);

        assert_eq!(noisy.len(), 16);
        assert!(noisy.iter().zip(&values).any(|(a, b)| (a - b).abs() > 1e-6));
    }

    #[test]
    fn test_gaussian_perturbs_values() {
        let injector = NoiseInjector::with_seed(1.0, 1e-5, 7).unwrap();
        let values = vec![0.5; 16];
        let noisy = injector.add_gaussian_noise(&values, 1.0);

        assert_eq!(noisy.len(), 16);
        assert!(noisy.iter().zip(&values).any(|(a, b)| (a - b).abs() > 1e-6));
    }

    fn mean_squared_perturbation(epsilon: f32, trials: usize) -> f64 {
        let injector = NoiseInjector::with_seed(epsilon, 1e-5, 42).unwrap();
        let values = vec![0.0; trials];
        let noisy = injector.add_laplace_noise(&values, 1.0);
        noisy.iter().map(|n| (*n as f64).powi(2)).sum::<f64>() / trials as f64
    }

    #[test]
    fn test_larger_epsilon_means_less_noise() {
        // Expected squared Laplace noise is 2 * (sensitivity / epsilon)^2,
        // so raising epsilon from 0.1 to 5.0 must shrink it sharply.
        let noisy = mean_squared_perturbation(0.1, 2000);
        let quiet = mean_squared_perturbation(5.0, 2000);

        assert!(noisy > quiet);
        assert!(quiet < 1.0);
    }

    #[test]
    fn test_gaussian_noise_tracks_epsilon() {
        let values = vec![0.0; 2000];

        let noisy_inj = NoiseInjector::with_seed(0.1, 1e-5, 42).unwrap();
        let quiet_inj = NoiseInjector::with_seed(5.0, 1e-5, 42).unwrap();

        let noisy: f64 = noisy_inj
            .add_gaussian_noise(&values, 1.0)
            .iter()
            .map(|n| (*n as f64).powi(2))
            .sum();
        let quiet: f64 = quiet_inj
            .add_gaussian_noise(&values, 1.0)
            .iter()
            .map(|n| (*n as f64).powi(2))
            .sum();

        assert!(noisy > quiet);
    }
}
