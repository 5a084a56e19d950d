//! Ensemble inference over trained participants.

use crate::coordinator::Coordinator;
use crate::ensemble::metrics::EvaluationReport;
use std::sync::Arc;
use tracing::{debug, warn};

/// Strict-majority vote per column: 1 iff strictly more than half of the
/// votes are 1, so ties resolve to 0.
pub fn majority_vote(votes: &[Vec<u8>]) -> Vec<u8> {
    let Some(first) = votes.first() else {
        return Vec::new();
    };

    (0..first.len())
        .map(|i| {
            let ones = votes.iter().filter(|v| v[i] == 1).count();
            (ones * 2 > votes.len()) as u8
        })
        .collect()
}

/// Combines trained participants' predictions into ensemble labels and
/// evaluation metrics.
pub struct EnsembleEvaluator {
    coordinator: Arc<Coordinator>,
}

impl EnsembleEvaluator {
    /// Create an evaluator over the coordinator's participants.
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Majority-vote prediction per input vector.
    ///
    /// Empty when no participant is trained.
    pub async fn predict(&self, vectors: &[Vec<f32>]) -> Vec<u8> {
        let mut votes: Vec<Vec<u8>> = Vec::new();

        for cell in self.coordinator.participant_cells().await {
            let participant = cell.lock().await;
            if !participant.is_trained() {
                continue;
            }

            match participant.predict(vectors) {
                Ok(predictions) if predictions.len() == vectors.len() => votes.push(predictions),
                Ok(_) => debug!(participant = %participant.id(), "prediction length mismatch"),
                Err(error) => warn!(participant = %participant.id(), %error, "prediction failed"),
            }
        }

        majority_vote(&votes)
    }

    /// Evaluate the ensemble against labeled data.
    ///
    /// `None` when predictions could not be produced or lengths disagree.
    pub async fn evaluate(&self, vectors: &[Vec<f32>], labels: &[u8]) -> Option<EvaluationReport> {
        let predictions = self.predict(vectors).await;
        if predictions.is_empty() || predictions.len() != labels.len() {
            return None;
        }

        let round = self.coordinator.round_count().await;
        Some(EvaluationReport::compute(round, &predictions, labels))
    }
}
