//! Synthetic network-traffic generation.
//!
//! NSL-KDD-like feature vectors for exercising the federation without real
//! capture data. Normal and attack traffic occupy distinct bands in the
//! leading features; the rest is uniform background.

use crate::core::{Error, Result, TrainingSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Features per generated sample.
pub const FEATURE_COUNT: usize = 10;

/// Leading features that carry the normal/attack signal.
const SIGNAL_FEATURES: usize = 4;

/// Seeded generator of labeled network-traffic samples.
pub struct TrafficGenerator {
    rng: StdRng,
    anomaly_ratio: f32,
}

impl TrafficGenerator {
    /// Create a generator with the default 10% anomaly ratio.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            anomaly_ratio: 0.1,
        }
    }

    /// Set the fraction of anomalous samples.
    pub fn with_anomaly_ratio(mut self, ratio: f32) -> Result<Self> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(Error::InvalidConfig(format!(
                "anomaly ratio must be in [0, 1], got {}",
                ratio
            )));
        }
        self.anomaly_ratio = ratio;
        Ok(self)
    }

    fn sample(&mut self, anomalous: bool) -> Vec<f32> {
        let (center, spread) = if anomalous { (0.8, 0.2) } else { (0.3, 0.1) };

        (0..FEATURE_COUNT)
            .map(|i| {
                if i < SIGNAL_FEATURES {
                    let z: f32 = self.rng.sample(StandardNormal);
                    center + spread * z
                } else {
                    self.rng.gen::<f32>()
                }
            })
            .collect()
    }

    /// Generate labeled samples.
    pub fn generate(&mut self, count: usize) -> Vec<TrainingSample> {
        (0..count)
            .map(|_| {
                let anomalous = self.rng.gen::<f32>() < self.anomaly_ratio;
                TrainingSample::new(self.sample(anomalous), anomalous as u8)
            })
            .collect()
    }

    /// Generate samples with the labels stripped.
    pub fn generate_unlabeled(&mut self, count: usize) -> Vec<TrainingSample> {
        self.generate(count)
            .into_iter()
            .map(|s| TrainingSample::unlabeled(s.features))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_ratio() {
        assert!(TrafficGenerator::new(1).with_anomaly_ratio(1.5).is_err());
        assert!(TrafficGenerator::new(1).with_anomaly_ratio(-0.1).is_err());
    }

    #[test]
    fn test_generates_requested_count() {
        let mut generator = TrafficGenerator::new(7);
        let samples = generator.generate(100);

        assert_eq!(samples.len(), 100);
        assert!(samples.iter().all(|s| s.feature_count() == FEATURE_COUNT));
        assert!(samples.iter().all(|s| s.label.is_some()));
    }

    #[test]
    fn test_anomaly_ratio_approximate() {
        let mut generator = TrafficGenerator::new(7).with_anomaly_ratio(0.5).unwrap();
        let samples = generator.generate(1000);

        let anomalies = samples.iter().filter(|s| s.label == Some(1)).count();
        assert!(anomalies > 400 && anomalies < 600);
    }

    #[test]
    fn test_attack_band_sits_higher() {
        let mut generator = TrafficGenerator::new(7).with_anomaly_ratio(0.5).unwrap();
        let samples = generator.generate(1000);

        let mean_of = |label: u8| {
            let selected: Vec<&TrainingSample> =
                samples.iter().filter(|s| s.label == Some(label)).collect();
            selected.iter().map(|s| s.features[0]).sum::<f32>() / selected.len() as f32
        };

        assert!(mean_of(1) > mean_of(0) + 0.3);
    }

    #[test]
    fn test_unlabeled_generation() {
        let mut generator = TrafficGenerator::new(7);
        let samples = generator.generate_unlabeled(10);
        assert!(samples.iter().all(|s| s.label.is_none()));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = TrafficGenerator::new(99).generate(20);
        let b = TrafficGenerator::new(99).generate(20);

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.features, y.features);
            assert_eq!(x.label, y.label);
        }
    }
}
