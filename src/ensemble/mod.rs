//! Ensemble Module
//!
//! Combined inference and evaluation across trained participants:
//! - Strict-majority voting
//! - Accuracy and support-weighted precision/recall/F1

pub mod evaluator;
pub mod metrics;

pub use evaluator::{majority_vote, EnsembleEvaluator};
pub use metrics::EvaluationReport;
