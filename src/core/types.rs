//! Common types used across fedsentry modules.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Kind of model a participant trains locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Supervised linear classifier trained with SGD
    LinearClassifier,
    /// Unsupervised centroid-distance anomaly detector
    AnomalyDetector,
    /// Aggregated global model (produced by aggregation, never trained directly)
    Ensemble,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::LinearClassifier => write!(f, "linear_classifier"),
            ModelKind::AnomalyDetector => write!(f, "anomaly_detector"),
            ModelKind::Ensemble => write!(f, "ensemble"),
        }
    }
}

/// A single feature vector with an optional binary label.
///
/// Label 1 marks anomalous traffic, 0 normal traffic. Unlabeled samples
/// get labels synthesized during training.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Input features
    pub features: Vec<f32>,
    /// Binary label (1 = anomalous, 0 = normal), if known
    pub label: Option<u8>,
}

impl TrainingSample {
    /// Create a labeled sample.
    pub fn new(features: Vec<f32>, label: u8) -> Self {
        Self {
            features,
            label: Some(label),
        }
    }

    /// Create an unlabeled sample.
    pub fn unlabeled(features: Vec<f32>) -> Self {
        Self {
            features,
            label: None,
        }
    }

    /// Number of features in this sample.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}
