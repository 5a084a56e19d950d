//! Statistical outlier detection over update vector norms.

use crate::aggregation::update::{common_keys, ModelUpdate};
use std::collections::BTreeSet;

/// Minimum update count for statistically meaningful flagging.
pub const MIN_UPDATES: usize = 3;

/// Euclidean norm of a vector.
pub fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Detects updates whose parameter vectors are statistical outliers.
///
/// Advisory only: it reports suspect indices but does not exclude anything
/// from aggregation. Callers wanting hard exclusion drop the flagged indices
/// before invoking a strategy.
#[derive(Clone, Debug)]
pub struct RobustnessAnalyzer {
    /// How many standard deviations above the baseline mean a norm must be
    sigma_threshold: f32,
}

impl RobustnessAnalyzer {
    /// Create an analyzer with the default 2-sigma threshold.
    pub fn new() -> Self {
        Self {
            sigma_threshold: 2.0,
        }
    }

    /// Set the sigma threshold.
    pub fn with_sigma_threshold(mut self, sigma: f32) -> Self {
        self.sigma_threshold = sigma;
        self
    }

    /// Flag updates whose norm is extreme for any parameter group common to
    /// the whole set.
    ///
    /// Each candidate is compared against the mean and standard deviation of
    /// the OTHER updates' norms, so one extreme value cannot inflate its own
    /// baseline. Fewer than [`MIN_UPDATES`] updates always yields an empty
    /// set.
    pub fn detect_outliers(&self, updates: &[ModelUpdate]) -> BTreeSet<usize> {
        let mut flagged = BTreeSet::new();
        if updates.len() < MIN_UPDATES {
            return flagged;
        }

        for key in common_keys(updates) {
            let norms: Vec<f32> = updates
                .iter()
                .map(|u| l2_norm(u.group(&key).unwrap_or(&[])))
                .collect();

            for i in 0..norms.len() {
                let rest: Vec<f32> = norms
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, n)| *n)
                    .collect();

                let mean = rest.iter().sum::<f32>() / rest.len() as f32;
                let variance =
                    rest.iter().map(|n| (n - mean).powi(2)).sum::<f32>() / rest.len() as f32;
                let threshold = mean + self.sigma_threshold * variance.sqrt();

                if norms[i] > threshold {
                    flagged.insert(i);
                }
            }
        }

        flagged
    }
}

impl Default for RobustnessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
