//! Local models trained on participant-held data.
//!
//! Deliberately simple reference models behind the [`LocalModel`] seam:
//! - Logistic linear classifier trained with SGD
//! - Centroid-distance anomaly detector (unsupervised)
//!
//! Real deployments plug their own detectors in through the trait; the
//! engine only consumes parameter groups and binary predictions.

use crate::aggregation::update::{
    ModelUpdate, COEFFICIENTS, FEATURE_DEVIATIONS, FEATURE_IMPORTANCES, FEATURE_MEANS,
};
use crate::core::ModelKind;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// A participant-owned model exposing named parameter vectors.
pub trait LocalModel: Send {
    /// Kind tag carried into updates.
    fn kind(&self) -> ModelKind;

    /// Whether training consumes the label vector.
    fn requires_labels(&self) -> bool {
        true
    }

    /// Fit the model to the given features and binary labels.
    fn fit(&mut self, features: &[&[f32]], labels: &[u8], epochs: usize);

    /// Predict one binary label (1 = anomalous).
    fn predict_one(&self, features: &[f32]) -> u8;

    /// Named parameter vectors for aggregation.
    fn parameter_groups(&self) -> HashMap<String, Vec<f32>>;

    /// Seed local parameters from a global update. Default: ignore it.
    fn adopt_global(&mut self, _update: &ModelUpdate) {}
}

/// Logistic classifier trained with per-sample SGD.
pub struct LinearModel {
    /// Feature weights followed by the bias term
    weights: Vec<f32>,
    feature_count: usize,
    learning_rate: f32,
}

impl LinearModel {
    /// Create with small random initialization.
    pub fn new(feature_count: usize, rng: &mut StdRng) -> Self {
        let scale = (2.0 / (feature_count.max(1)) as f32).sqrt();
        let weights = (0..feature_count + 1)
            .map(|_| rng.gen::<f32>() * scale - scale / 2.0)
            .collect();

        Self {
            weights,
            feature_count,
            learning_rate: 0.01,
        }
    }

    /// Set learning rate.
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    fn forward(&self, features: &[f32]) -> f32 {
        let bias = self.weights[self.feature_count];
        self.weights[..self.feature_count]
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + bias
    }

    fn sigmoid(z: f32) -> f32 {
        1.0 / (1.0 + (-z).exp())
    }
}

impl LocalModel for LinearModel {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearClassifier
    }

    fn fit(&mut self, features: &[&[f32]], labels: &[u8], epochs: usize) {
        for _epoch in 0..epochs {
            for (x, y) in features.iter().zip(labels) {
                let error = Self::sigmoid(self.forward(x)) - *y as f32;
                for (w, value) in self.weights[..self.feature_count].iter_mut().zip(*x) {
                    *w -= self.learning_rate * error * value;
                }
                self.weights[self.feature_count] -= self.learning_rate * error;
            }
        }
    }

    fn predict_one(&self, features: &[f32]) -> u8 {
        (Self::sigmoid(self.forward(features)) > 0.5) as u8
    }

    fn parameter_groups(&self) -> HashMap<String, Vec<f32>> {
        let coefficients = self.weights[..self.feature_count].to_vec();
        let magnitude: f32 = coefficients.iter().map(|w| w.abs()).sum();

        let importances = if magnitude > 0.0 {
            coefficients.iter().map(|w| w.abs() / magnitude).collect()
        } else {
            vec![0.0; self.feature_count]
        };

        let mut groups = HashMap::new();
        groups.insert(COEFFICIENTS.to_string(), coefficients);
        groups.insert(FEATURE_IMPORTANCES.to_string(), importances);
        groups
    }

    fn adopt_global(&mut self, update: &ModelUpdate) {
        if let Some(global) = update.group(COEFFICIENTS) {
            if global.len() == self.feature_count {
                self.weights[..self.feature_count].copy_from_slice(global);
            }
        }
    }
}

/// Unsupervised anomaly detector over per-feature z-scores.
pub struct CentroidModel {
    means: Vec<f32>,
    deviations: Vec<f32>,
    /// Mean absolute z-score above which a sample is anomalous
    threshold: f32,
}

impl CentroidModel {
    /// Create an unfitted detector with the default threshold.
    pub fn new(feature_count: usize) -> Self {
        Self {
            means: vec![0.0; feature_count],
            deviations: vec![1.0; feature_count],
            threshold: 2.0,
        }
    }

    /// Set the anomaly threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    fn score(&self, features: &[f32]) -> f32 {
        if self.means.is_empty() {
            return 0.0;
        }
        let z_sum: f32 = features
            .iter()
            .zip(self.means.iter().zip(&self.deviations))
            .map(|(x, (mean, dev))| (x - mean).abs() / dev.max(1e-6))
            .sum();
        z_sum / self.means.len() as f32
    }
}

impl LocalModel for CentroidModel {
    fn kind(&self) -> ModelKind {
        ModelKind::AnomalyDetector
    }

    fn requires_labels(&self) -> bool {
        false
    }

    fn fit(&mut self, features: &[&[f32]], _labels: &[u8], _epochs: usize) {
        let n = features.len();
        if n == 0 {
            return;
        }
        let dim = self.means.len();

        let mut means = vec![0.0f32; dim];
        for sample in features {
            for (acc, x) in means.iter_mut().zip(*sample) {
                *acc += x;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n as f32;
        }

        let mut deviations = vec![0.0f32; dim];
        for sample in features {
            for ((acc, x), mean) in deviations.iter_mut().zip(*sample).zip(&means) {
                *acc += (x - mean).powi(2);
            }
        }
        for dev in deviations.iter_mut() {
            *dev = (*dev / n as f32).sqrt();
        }

        self.means = means;
        self.deviations = deviations;
    }

    fn predict_one(&self, features: &[f32]) -> u8 {
        (self.score(features) > self.threshold) as u8
    }

    fn parameter_groups(&self) -> HashMap<String, Vec<f32>> {
        let mut groups = HashMap::new();
        groups.insert(FEATURE_MEANS.to_string(), self.means.clone());
        groups.insert(FEATURE_DEVIATIONS.to_string(), self.deviations.clone());
        groups
    }
}

/// Synthesize binary labels for an unlabeled batch.
///
/// Auxiliary outlier detector: a sample whose mean absolute per-feature
/// z-score exceeds 2 is labeled anomalous.
pub(crate) fn synthesize_labels(features: &[&[f32]]) -> Vec<u8> {
    let n = features.len();
    let Some(first) = features.first() else {
        return Vec::new();
    };
    let dim = first.len();

    let mut means = vec![0.0f32; dim];
    for sample in features {
        for (acc, x) in means.iter_mut().zip(*sample) {
            *acc += x;
        }
    }
    for mean in means.iter_mut() {
        *mean /= n as f32;
    }

    let mut deviations = vec![0.0f32; dim];
    for sample in features {
        for ((acc, x), mean) in deviations.iter_mut().zip(*sample).zip(&means) {
            *acc += (x - mean).powi(2);
        }
    }
    for dev in deviations.iter_mut() {
        *dev = (*dev / n as f32).sqrt();
    }

    features
        .iter()
        .map(|sample| {
            let z_sum: f32 = sample
                .iter()
                .zip(means.iter().zip(&deviations))
                .map(|(x, (mean, dev))| (x - mean).abs() / dev.max(1e-6))
                .sum();
            (z_sum / dim.max(1) as f32 > 2.0) as u8
        })
        .collect()
}
