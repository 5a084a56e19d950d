//! A federated participant holding private local data.
//!
//! Raw data never leaves the participant; only parameter-group updates do.

use crate::aggregation::ModelUpdate;
use crate::core::{now, Error, ModelKind, Result, Timestamp, TrainingSample};
use crate::participant::model::{synthesize_labels, CentroidModel, LinearModel, LocalModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Minimum local samples required for training.
pub const MIN_TRAIN_SAMPLES: usize = 10;

/// One local training run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingEntry {
    /// When the run completed
    pub timestamp: Timestamp,
    /// Samples used
    pub sample_count: usize,
    /// Features per sample
    pub feature_count: usize,
}

/// An independent holder of private local data and a local model.
pub struct Participant {
    id: String,
    kind: ModelKind,
    /// Built lazily at first training, once the feature count is known
    model: Option<Box<dyn LocalModel + Send>>,
    data: Vec<TrainingSample>,
    is_trained: bool,
    privacy_budget: f32,
    training_history: Vec<TrainingEntry>,
    local_accuracy: f32,
    rng: StdRng,
}

impl Participant {
    /// Create a participant with an entropy-seeded model initializer.
    pub fn new(id: &str, kind: ModelKind) -> Result<Self> {
        Self::from_rng(id, kind, StdRng::from_entropy())
    }

    /// Create with a fixed seed for reproducible model initialization.
    pub fn with_seed(id: &str, kind: ModelKind, seed: u64) -> Result<Self> {
        Self::from_rng(id, kind, StdRng::seed_from_u64(seed))
    }

    fn from_rng(id: &str, kind: ModelKind, rng: StdRng) -> Result<Self> {
        if kind == ModelKind::Ensemble {
            return Err(Error::InvalidConfig(
                "participants cannot train an ensemble model".to_string(),
            ));
        }
        Ok(Self {
            id: id.to_string(),
            kind,
            model: None,
            data: Vec::new(),
            is_trained: false,
            privacy_budget: 1.0,
            training_history: Vec::new(),
            local_accuracy: 0.0,
            rng,
        })
    }

    /// Set the privacy budget (epsilon; smaller = more private).
    pub fn with_privacy_budget(mut self, epsilon: f32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidPrivacyBudget(epsilon));
        }
        self.privacy_budget = epsilon;
        Ok(self)
    }

    /// Participant id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Model kind tag.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Whether a local training run has succeeded.
    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    /// Privacy budget epsilon.
    pub fn privacy_budget(&self) -> f32 {
        self.privacy_budget
    }

    /// Local dataset size.
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// Accuracy measured on the last training run.
    pub fn local_accuracy(&self) -> f32 {
        self.local_accuracy
    }

    /// Completed training runs.
    pub fn training_history(&self) -> &[TrainingEntry] {
        &self.training_history
    }

    /// Append a batch of samples to local storage.
    pub fn add_data(&mut self, batch: Vec<TrainingSample>) {
        self.data.extend(batch);
    }

    /// Train the local model and return an update for aggregation.
    ///
    /// Fails with [`Error::InsufficientData`] below [`MIN_TRAIN_SAMPLES`].
    /// When `global` is given, the model adopts its parameters before
    /// fitting. Unlabeled batches get labels synthesized by an auxiliary
    /// outlier detector.
    pub async fn local_train(
        &mut self,
        global: Option<&ModelUpdate>,
        epochs: usize,
    ) -> Result<ModelUpdate> {
        if self.data.len() < MIN_TRAIN_SAMPLES {
            return Err(Error::InsufficientData {
                id: self.id.clone(),
                have: self.data.len(),
                need: MIN_TRAIN_SAMPLES,
            });
        }

        let feature_count = self.data[0].feature_count();
        let features: Vec<&[f32]> = self.data.iter().map(|s| s.features.as_slice()).collect();

        let labels: Vec<u8> = if self.data.iter().all(|s| s.label.is_some()) {
            self.data.iter().map(|s| s.label.unwrap_or(0)).collect()
        } else {
            synthesize_labels(&features)
        };

        let model = self.model.get_or_insert_with(|| match self.kind {
            ModelKind::AnomalyDetector => Box::new(CentroidModel::new(feature_count)),
            _ => Box::new(LinearModel::new(feature_count, &mut self.rng)),
        });

        if let Some(global) = global {
            model.adopt_global(global);
        }

        model.fit(&features, &labels, epochs.max(1));

        let correct = features
            .iter()
            .zip(&labels)
            .filter(|(x, y)| model.predict_one(x) == **y)
            .count();
        self.local_accuracy = correct as f32 / features.len() as f32;

        self.is_trained = true;
        self.training_history.push(TrainingEntry {
            timestamp: now(),
            sample_count: self.data.len(),
            feature_count,
        });

        info!(
            participant = %self.id,
            samples = self.data.len(),
            accuracy = self.local_accuracy,
            "local training completed"
        );

        let mut update = ModelUpdate::new(
            &self.id,
            self.kind,
            self.data.len() as u64,
            self.local_accuracy,
        );
        update.groups = model.parameter_groups();
        Ok(update)
    }

    /// Predict one binary label per input vector (1 = anomalous).
    pub fn predict(&self, vectors: &[Vec<f32>]) -> Result<Vec<u8>> {
        let model = match (&self.model, self.is_trained) {
            (Some(model), true) => model,
            _ => return Err(Error::NotTrained(self.id.clone())),
        };

        Ok(vectors.iter().map(|v| model.predict_one(v)).collect())
    }
}
