//! Participant Module
//!
//! Federated learning participants:
//! - Private local datasets and training history
//! - Pluggable local models (linear classifier, anomaly detector)
//! - Label synthesis for unlabeled batches

pub mod model;
pub mod node;

pub use model::{CentroidModel, LinearModel, LocalModel};
pub use node::{Participant, TrainingEntry, MIN_TRAIN_SAMPLES};
