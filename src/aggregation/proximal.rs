//! Proximal averaging toward a reference update (FedProx).

use crate::aggregation::average::{mean_accuracy, weighted_groups};
use crate::aggregation::update::{ModelUpdate, GLOBAL_ID};
use crate::aggregation::{AggregationStrategy, NoisePolicy};
use crate::core::{Error, ModelKind, Result};

/// Default proximal coefficient.
pub const DEFAULT_MU: f32 = 0.1;

/// Weighted averaging blended toward the first update in the set.
///
/// The result is `(1 - mu) * weighted_average + mu * reference`. Larger `mu`
/// biases the global model toward the reference participant, trading
/// convergence speed for stability under heterogeneous data.
pub struct ProximalAverage {
    mu: f32,
    noise: Option<NoisePolicy>,
}

impl ProximalAverage {
    /// Create a proximal strategy with coefficient `mu` in (0, 1).
    pub fn new(mu: f32) -> Result<Self> {
        if !mu.is_finite() || mu <= 0.0 || mu >= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "proximal coefficient must be in (0, 1), got {}",
                mu
            )));
        }
        Ok(Self { mu, noise: None })
    }

    /// Apply differential-privacy noise to the aggregated groups.
    pub fn with_noise(mut self, noise: NoisePolicy) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Proximal coefficient.
    pub fn mu(&self) -> f32 {
        self.mu
    }
}

impl Default for ProximalAverage {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            noise: None,
        }
    }
}

impl AggregationStrategy for ProximalAverage {
    fn name(&self) -> &'static str {
        "fedprox"
    }

    fn aggregate(&self, updates: &[ModelUpdate]) -> ModelUpdate {
        if updates.is_empty() {
            return ModelUpdate::empty();
        }

        let total: u64 = updates.iter().map(|u| u.sample_count).sum();
        let reference = &updates[0];
        let mut groups = weighted_groups(updates);

        for (key, averaged) in groups.iter_mut() {
            // The reference is part of the intersection, so the key and
            // dimension are guaranteed to match.
            if let Some(anchor) = reference.group(key) {
                for (value, r) in averaged.iter_mut().zip(anchor) {
                    *value = (1.0 - self.mu) * *value + self.mu * r;
                }
            }
        }

        if let Some(noise) = &self.noise {
            noise.apply_groups(&mut groups);
        }

        let mut result = ModelUpdate::new(GLOBAL_ID, ModelKind::Ensemble, total, mean_accuracy(updates));
        result.groups = groups;
        result
    }
}
