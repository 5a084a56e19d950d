//! Non-IID data partitioning and distribution analysis.

use crate::core::TrainingSample;
use serde::{Deserialize, Serialize};

/// Split samples into contiguous shards, one per participant.
///
/// Contiguous slicing preserves whatever ordering skew the source data has,
/// which is what makes the shards non-IID. The last shard absorbs the
/// remainder.
pub fn partition_non_iid(samples: Vec<TrainingSample>, shards: usize) -> Vec<Vec<TrainingSample>> {
    if shards == 0 || samples.is_empty() {
        return Vec::new();
    }

    let per_shard = samples.len() / shards;
    let mut partitions: Vec<Vec<TrainingSample>> = Vec::with_capacity(shards);
    let mut remaining = samples;

    for i in 0..shards {
        if i == shards - 1 {
            partitions.push(std::mem::take(&mut remaining));
        } else {
            let take = per_shard.min(remaining.len());
            let rest = remaining.split_off(take);
            partitions.push(std::mem::replace(&mut remaining, rest));
        }
    }

    partitions
}

/// Statistics of one participant's local data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataDistribution {
    /// Number of samples
    pub sample_count: usize,
    /// Fraction of labeled samples marked anomalous
    pub anomaly_ratio: f32,
    /// Per-feature means
    pub feature_means: Vec<f32>,
    /// Label imbalance in [0, 1] (0 = perfectly balanced)
    pub skewness: f32,
}

impl DataDistribution {
    /// Analyze a local dataset.
    pub fn analyze(samples: &[TrainingSample]) -> Self {
        if samples.is_empty() {
            return Self {
                sample_count: 0,
                anomaly_ratio: 0.0,
                feature_means: Vec::new(),
                skewness: 0.0,
            };
        }

        let n = samples.len();
        let dim = samples[0].feature_count();
        let mut feature_means = vec![0.0f32; dim];
        for sample in samples {
            for (acc, x) in feature_means.iter_mut().zip(&sample.features) {
                *acc += x;
            }
        }
        for mean in feature_means.iter_mut() {
            *mean /= n as f32;
        }

        let labeled: Vec<u8> = samples.iter().filter_map(|s| s.label).collect();
        let anomalies = labeled.iter().filter(|l| **l == 1).count();
        let normals = labeled.len() - anomalies;

        let anomaly_ratio = if labeled.is_empty() {
            0.0
        } else {
            anomalies as f32 / labeled.len() as f32
        };

        let skewness = if labeled.is_empty() {
            0.0
        } else {
            let max = anomalies.max(normals) as f32;
            let min = anomalies.min(normals) as f32;
            if max > 0.0 {
                (max - min) / max
            } else {
                0.0
            }
        };

        Self {
            sample_count: n,
            anomaly_ratio,
            feature_means,
            skewness,
        }
    }

    /// Whether the labels are roughly balanced.
    pub fn is_balanced(&self) -> bool {
        self.skewness < 0.3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<TrainingSample> {
        (0..n)
            .map(|i| TrainingSample::new(vec![i as f32], (i % 2) as u8))
            .collect()
    }

    #[test]
    fn test_partition_sizes() {
        let partitions = partition_non_iid(samples(10), 3);
        let sizes: Vec<usize> = partitions.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![3, 3, 4]);
    }

    #[test]
    fn test_partition_preserves_order() {
        let partitions = partition_non_iid(samples(6), 2);
        assert_eq!(partitions[0][0].features, vec![0.0]);
        assert_eq!(partitions[1][0].features, vec![3.0]);
    }

    #[test]
    fn test_zero_shards() {
        assert!(partition_non_iid(samples(5), 0).is_empty());
    }

    #[test]
    fn test_more_shards_than_samples() {
        let partitions = partition_non_iid(samples(2), 4);
        assert_eq!(partitions.len(), 4);
        let total: usize = partitions.iter().map(|p| p.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_analyze_balanced_labels() {
        let distribution = DataDistribution::analyze(&samples(10));

        assert_eq!(distribution.sample_count, 10);
        assert!((distribution.anomaly_ratio - 0.5).abs() < 1e-5);
        assert!(distribution.is_balanced());
    }

    #[test]
    fn test_analyze_skewed_labels() {
        let mut data = vec![];
        for i in 0..9 {
            data.push(TrainingSample::new(vec![i as f32], 0));
        }
        data.push(TrainingSample::new(vec![9.0], 1));

        let distribution = DataDistribution::analyze(&data);
        assert!(distribution.skewness > 0.7);
        assert!(!distribution.is_balanced());
    }

    #[test]
    fn test_analyze_empty() {
        let distribution = DataDistribution::analyze(&[]);
        assert_eq!(distribution.sample_count, 0);
        assert!(distribution.is_balanced());
    }
}
