//! Aggregation Module
//!
//! Combines one round's participant updates into a global update:
//! - Sample-weighted plain averaging (FedAvg)
//! - Proximal averaging toward a reference update (FedProx)
//! - Byzantine-robust trimmed averaging
//! - Optional differential-privacy noise on aggregated groups

pub mod average;
pub mod proximal;
pub mod trimmed;
pub mod update;

pub use average::PlainAverage;
pub use proximal::ProximalAverage;
pub use trimmed::TrimmedRobustAverage;
pub use update::ModelUpdate;

use crate::privacy::NoiseInjector;
use std::collections::HashMap;

/// A strategy combining a set of participant updates into one global update.
///
/// An empty input set yields [`ModelUpdate::empty`], never an error. Keys
/// absent from any update are skipped entirely rather than zero-filled.
pub trait AggregationStrategy: Send + Sync {
    /// Registry name of this strategy.
    fn name(&self) -> &'static str;

    /// Combine the given updates.
    fn aggregate(&self, updates: &[ModelUpdate]) -> ModelUpdate;
}

/// Which noise mechanism a [`NoisePolicy`] applies.
#[derive(Clone, Copy, Debug)]
pub enum NoiseMechanism {
    /// Laplace noise for pure epsilon-DP
    Laplace,
    /// Gaussian noise for (epsilon, delta)-DP
    Gaussian,
}

/// Differential-privacy noise applied to aggregated parameter groups.
pub struct NoisePolicy {
    injector: NoiseInjector,
    sensitivity: f32,
    mechanism: NoiseMechanism,
}

impl NoisePolicy {
    /// Laplace noise with the given sensitivity.
    pub fn laplace(injector: NoiseInjector, sensitivity: f32) -> Self {
        Self {
            injector,
            sensitivity,
            mechanism: NoiseMechanism::Laplace,
        }
    }

    /// Gaussian noise with the given sensitivity.
    pub fn gaussian(injector: NoiseInjector, sensitivity: f32) -> Self {
        Self {
            injector,
            sensitivity,
            mechanism: NoiseMechanism::Gaussian,
        }
    }

    /// Perturb a single vector.
    pub fn apply(&self, values: &[f32]) -> Vec<f32> {
        match self.mechanism {
            NoiseMechanism::Laplace => self.injector.add_laplace_noise(values, self.sensitivity),
            NoiseMechanism::Gaussian => self.injector.add_gaussian_noise(values, self.sensitivity),
        }
    }

    /// Perturb every group in place.
    pub(crate) fn apply_groups(&self, groups: &mut HashMap<String, Vec<f32>>) {
        for values in groups.values_mut() {
            *values = self.apply(values);
        }
    }
}
