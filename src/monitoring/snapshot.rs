//! Read-only observability snapshots.
//!
//! Plain value exports for dashboards and metrics exporters. The engine
//! never blocks on their delivery.

use crate::core::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summary of one completed round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Round number (1-based)
    pub round: u32,
    /// When the round completed
    pub timestamp: Timestamp,
    /// Participants that contributed an update
    pub participant_count: usize,
    /// Sum of contributing updates' sample counts
    pub total_samples: u64,
    /// Strategy that produced the aggregate
    pub strategy: String,
}

/// Current engine state for observability collaborators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Completed rounds
    pub round: u32,
    /// Accuracy of the current global model
    pub global_accuracy: f32,
    /// Active aggregation strategy
    pub strategy: String,
    /// Whether a round is currently running
    pub training_in_progress: bool,
    /// Registered participants
    pub participant_count: usize,
    /// Most recent round snapshots, oldest first
    pub recent_rounds: Vec<RoundSnapshot>,
}

/// Listener notified after every completed round.
///
/// Notifications are dispatched on a separate task; a slow observer never
/// delays the round path.
#[async_trait]
pub trait RoundObserver: Send + Sync {
    /// Called once per completed round.
    async fn on_round_complete(&self, snapshot: RoundSnapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[test]
    fn test_snapshot_serializes_to_json() {
        let snapshot = RoundSnapshot {
            round: 3,
            timestamp: now(),
            participant_count: 5,
            total_samples: 1200,
            strategy: "fedavg".to_string(),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"round\":3"));
        assert!(json.contains("fedavg"));

        let parsed: RoundSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.total_samples, 1200);
    }

    #[test]
    fn test_status_serializes_to_json() {
        let status = EngineStatus {
            round: 2,
            global_accuracy: 0.87,
            strategy: "trimmed_mean".to_string(),
            training_in_progress: false,
            participant_count: 4,
            recent_rounds: Vec::new(),
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("trimmed_mean"));
    }
}
