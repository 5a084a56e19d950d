//! Classification metrics for ensemble evaluation.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// Evaluation of the global ensemble against labeled data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Rounds completed when the evaluation ran
    pub round: u32,
    /// Fraction of correct predictions
    pub accuracy: f32,
    /// Support-weighted precision
    pub precision: f32,
    /// Support-weighted recall
    pub recall: f32,
    /// Support-weighted F1
    pub f1: f32,
    /// Evaluated sample count
    pub sample_count: usize,
    /// When the evaluation ran
    pub timestamp: Timestamp,
}

impl EvaluationReport {
    /// Compute a report from predictions and true labels of equal length.
    pub fn compute(round: u32, predictions: &[u8], labels: &[u8]) -> Self {
        let total = labels.len();
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();

        let mut precision = 0.0f32;
        let mut recall = 0.0f32;
        let mut f1 = 0.0f32;

        for class in [0u8, 1u8] {
            let support = labels.iter().filter(|l| **l == class).count();
            if support == 0 {
                continue;
            }

            let tp = predictions
                .iter()
                .zip(labels)
                .filter(|(p, l)| **p == class && **l == class)
                .count();
            let fp = predictions
                .iter()
                .zip(labels)
                .filter(|(p, l)| **p == class && **l != class)
                .count();

            let class_precision = if tp + fp > 0 {
                tp as f32 / (tp + fp) as f32
            } else {
                0.0
            };
            let class_recall = tp as f32 / support as f32;
            let class_f1 = if class_precision + class_recall > 0.0 {
                2.0 * class_precision * class_recall / (class_precision + class_recall)
            } else {
                0.0
            };

            let weight = support as f32 / total as f32;
            precision += weight * class_precision;
            recall += weight * class_recall;
            f1 += weight * class_f1;
        }

        Self {
            round,
            accuracy: correct as f32 / total.max(1) as f32,
            precision,
            recall,
            f1,
            sample_count: total,
            timestamp: now(),
        }
    }
}
