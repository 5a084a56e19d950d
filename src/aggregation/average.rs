//! Sample-weighted plain averaging (FedAvg).

use crate::aggregation::update::{common_keys, ModelUpdate, GLOBAL_ID};
use crate::aggregation::{AggregationStrategy, NoisePolicy};
use crate::core::ModelKind;
use std::collections::HashMap;
use tracing::debug;

/// Sample-count-weighted averaging over the intersection of reported keys.
///
/// Offers no Byzantine tolerance; a single extreme update shifts the result
/// in proportion to its sample count.
#[derive(Default)]
pub struct PlainAverage {
    noise: Option<NoisePolicy>,
}

impl PlainAverage {
    /// Create a plain averaging strategy.
    pub fn new() -> Self {
        Self { noise: None }
    }

    /// Apply differential-privacy noise to the aggregated groups.
    pub fn with_noise(mut self, noise: NoisePolicy) -> Self {
        self.noise = Some(noise);
        self
    }
}

/// Weighted average of every parameter group common to all updates.
///
/// Weight is `sample_count / total_samples`. Keys whose vectors disagree in
/// length across updates are skipped.
pub(crate) fn weighted_groups(updates: &[ModelUpdate]) -> HashMap<String, Vec<f32>> {
    let total: u64 = updates.iter().map(|u| u.sample_count).sum();
    let mut groups = HashMap::new();
    if total == 0 {
        return groups;
    }

    for key in common_keys(updates) {
        let dim = updates[0].groups[&key].len();
        if updates.iter().any(|u| u.groups[&key].len() != dim) {
            debug!(key = %key, "skipping group with inconsistent dimensions");
            continue;
        }

        let mut averaged = vec![0.0f32; dim];
        for update in updates {
            let weight = update.sample_count as f32 / total as f32;
            for (acc, value) in averaged.iter_mut().zip(&update.groups[&key]) {
                *acc += weight * value;
            }
        }
        groups.insert(key, averaged);
    }

    groups
}

/// Unweighted mean of the reported accuracies.
pub(crate) fn mean_accuracy(updates: &[ModelUpdate]) -> f32 {
    if updates.is_empty() {
        return 0.0;
    }
    updates.iter().map(|u| u.accuracy).sum::<f32>() / updates.len() as f32
}

impl AggregationStrategy for PlainAverage {
    fn name(&self) -> &'static str {
        "fedavg"
    }

    fn aggregate(&self, updates: &[ModelUpdate]) -> ModelUpdate {
        if updates.is_empty() {
            return ModelUpdate::empty();
        }

        let total: u64 = updates.iter().map(|u| u.sample_count).sum();
        let mut groups = weighted_groups(updates);
        if let Some(noise) = &self.noise {
            noise.apply_groups(&mut groups);
        }

        let mut result = ModelUpdate::new(GLOBAL_ID, ModelKind::Ensemble, total, mean_accuracy(updates));
        result.groups = groups;
        result
    }
}
