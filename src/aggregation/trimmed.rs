//! Byzantine-robust trimmed averaging.

use crate::aggregation::average::mean_accuracy;
use crate::aggregation::update::{common_keys, ModelUpdate, GLOBAL_ID};
use crate::aggregation::{AggregationStrategy, NoisePolicy};
use crate::core::{Error, ModelKind, Result};
use crate::robustness::{l2_norm, RobustnessAnalyzer};
use tracing::{debug, warn};

/// Default fraction trimmed from each end.
pub const DEFAULT_TRIM_RATIO: f32 = 0.2;

/// Trimmed averaging over per-key norm order.
///
/// For each parameter group, updates are sorted by the L2 norm of their
/// vector and `floor(trim_ratio * N)` are dropped from each end before an
/// unweighted average of the rest. This is the only strategy that survives
/// Byzantine participants; plain and proximal averaging do not.
pub struct TrimmedRobustAverage {
    trim_ratio: f32,
    analyzer: RobustnessAnalyzer,
    noise: Option<NoisePolicy>,
}

impl TrimmedRobustAverage {
    /// Create a trimmed strategy with ratio in [0, 0.5).
    pub fn new(trim_ratio: f32) -> Result<Self> {
        if !trim_ratio.is_finite() || !(0.0..0.5).contains(&trim_ratio) {
            return Err(Error::InvalidConfig(format!(
                "trim ratio must be in [0, 0.5), got {}",
                trim_ratio
            )));
        }
        Ok(Self {
            trim_ratio,
            analyzer: RobustnessAnalyzer::new(),
            noise: None,
        })
    }

    /// Apply differential-privacy noise to the aggregated groups.
    pub fn with_noise(mut self, noise: NoisePolicy) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Trim fraction per end.
    pub fn trim_ratio(&self) -> f32 {
        self.trim_ratio
    }
}

impl Default for TrimmedRobustAverage {
    fn default() -> Self {
        Self {
            trim_ratio: DEFAULT_TRIM_RATIO,
            analyzer: RobustnessAnalyzer::new(),
            noise: None,
        }
    }
}

impl AggregationStrategy for TrimmedRobustAverage {
    fn name(&self) -> &'static str {
        "trimmed_mean"
    }

    fn aggregate(&self, updates: &[ModelUpdate]) -> ModelUpdate {
        if updates.is_empty() {
            return ModelUpdate::empty();
        }

        // Advisory flagging only; structural exclusion happens per key below.
        let suspects = self.analyzer.detect_outliers(updates);
        if !suspects.is_empty() {
            let ids: Vec<&str> = suspects
                .iter()
                .map(|i| updates[*i].participant_id.as_str())
                .collect();
            warn!(?ids, "outlier updates detected during trimmed aggregation");
        }

        let n = updates.len();
        let n_trim = (self.trim_ratio * n as f32).floor() as usize;
        let total: u64 = updates.iter().map(|u| u.sample_count).sum();

        let mut result = ModelUpdate::new(GLOBAL_ID, ModelKind::Ensemble, total, mean_accuracy(updates));

        for key in common_keys(updates) {
            let dim = updates[0].groups[&key].len();
            if updates.iter().any(|u| u.groups[&key].len() != dim) {
                debug!(key = %key, "skipping group with inconsistent dimensions");
                continue;
            }

            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|a, b| {
                let na = l2_norm(&updates[*a].groups[&key]);
                let nb = l2_norm(&updates[*b].groups[&key]);
                na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal)
            });

            let retained = &order[n_trim..n - n_trim];
            let mut averaged = vec![0.0f32; dim];
            for idx in retained {
                for (acc, value) in averaged.iter_mut().zip(&updates[*idx].groups[&key]) {
                    *acc += value;
                }
            }
            for value in averaged.iter_mut() {
                *value /= retained.len() as f32;
            }

            result.groups.insert(key, averaged);
        }

        if let Some(noise) = &self.noise {
            noise.apply_groups(&mut result.groups);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::update::COEFFICIENTS;

    fn update(id: &str, coeffs: Vec<f32>) -> ModelUpdate {
        ModelUpdate::new(id, ModelKind::LinearClassifier, 10, 0.8)
            .with_group(COEFFICIENTS, coeffs)
    }

    #[test]
    fn test_rejects_invalid_ratio() {
        assert!(TrimmedRobustAverage::new(0.5).is_err());
        assert!(TrimmedRobustAverage::new(-0.1).is_err());
        assert!(TrimmedRobustAverage::new(0.0).is_ok());
        assert!(TrimmedRobustAverage::new(0.49).is_ok());
    }

    #[test]
    fn test_trims_one_from_each_end_at_five() {
        let strategy = TrimmedRobustAverage::default();
        let updates = vec![
            update("a", vec![1.0]),
            update("b", vec![2.0]),
            update("c", vec![3.0]),
            update("d", vec![4.0]),
            update("e", vec![100.0]),
        ];

        let result = strategy.aggregate(&updates);
        // Lowest (1.0) and highest (100.0) are dropped; mean of [2, 3, 4].
        let coeffs = result.group(COEFFICIENTS).unwrap();
        assert!((coeffs[0] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_byzantine_update_does_not_shift_result() {
        let strategy = TrimmedRobustAverage::default();
        let mut updates = vec![
            update("a", vec![1.0, 1.0]),
            update("b", vec![1.1, 0.9]),
            update("c", vec![0.9, 1.1]),
            update("d", vec![1.0, 1.0]),
        ];
        updates.push(update("byzantine", vec![1000.0, -1000.0]));

        let result = strategy.aggregate(&updates);
        let coeffs = result.group(COEFFICIENTS).unwrap();
        assert!(coeffs[0].abs() < 2.0);
        assert!(coeffs[1].abs() < 2.0);
    }

    #[test]
    fn test_zero_ratio_is_plain_unweighted_mean() {
        let strategy = TrimmedRobustAverage::new(0.0).unwrap();
        let updates = vec![update("a", vec![1.0]), update("b", vec![3.0])];

        let result = strategy.aggregate(&updates);
        assert!((result.group(COEFFICIENTS).unwrap()[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_set_yields_noop_update() {
        let strategy = TrimmedRobustAverage::default();
        assert!(strategy.aggregate(&[]).is_empty());
    }
}
