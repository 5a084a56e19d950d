//! Model update exchanged between participants and the aggregator.

use crate::core::{now, ModelKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Participant id used for aggregated global updates.
pub const GLOBAL_ID: &str = "global";

/// Well-known parameter group names.
pub const COEFFICIENTS: &str = "coefficients";
pub const FEATURE_IMPORTANCES: &str = "feature_importances";
pub const FEATURE_MEANS: &str = "feature_means";
pub const FEATURE_DEVIATIONS: &str = "feature_deviations";

/// The value a participant returns from local training.
///
/// Immutable once returned; the coordinator only reads it. Parameter groups
/// are named numeric vectors whose presence depends on the model kind, so
/// aggregation operates on the intersection of reported names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelUpdate {
    /// Participant that produced this update
    pub participant_id: String,
    /// Kind of model the parameters came from
    pub model_kind: ModelKind,
    /// Samples used for training (the aggregation weight)
    pub sample_count: u64,
    /// Accuracy the participant measured on its own training data
    pub accuracy: f32,
    /// Named parameter-group vectors
    pub groups: HashMap<String, Vec<f32>>,
    /// Production timestamp
    pub timestamp: Timestamp,
}

impl ModelUpdate {
    /// Create an update with no parameter groups.
    pub fn new(participant_id: &str, model_kind: ModelKind, sample_count: u64, accuracy: f32) -> Self {
        Self {
            participant_id: participant_id.to_string(),
            model_kind,
            sample_count,
            accuracy,
            groups: HashMap::new(),
            timestamp: now(),
        }
    }

    /// Attach a named parameter group.
    pub fn with_group(mut self, name: &str, values: Vec<f32>) -> Self {
        self.groups.insert(name.to_string(), values);
        self
    }

    /// The no-op aggregate returned for an empty update set.
    pub fn empty() -> Self {
        Self::new(GLOBAL_ID, ModelKind::Ensemble, 0, 0.0)
    }

    /// Look up a parameter group by name.
    pub fn group(&self, name: &str) -> Option<&[f32]> {
        self.groups.get(name).map(|v| v.as_slice())
    }

    /// Whether this update carries no parameters and no samples.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.sample_count == 0
    }
}

/// Parameter-group names present in every update, sorted for determinism.
pub fn common_keys(updates: &[ModelUpdate]) -> Vec<String> {
    let Some(first) = updates.first() else {
        return Vec::new();
    };

    let mut keys: Vec<String> = first
        .groups
        .keys()
        .filter(|k| updates.iter().all(|u| u.groups.contains_key(*k)))
        .cloned()
        .collect();
    keys.sort();
    keys
}
