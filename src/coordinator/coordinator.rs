//! Round orchestration and global model state.
//!
//! The coordinator owns the participant registry, the strategy registry,
//! the global model, and the append-only round history. All engine state
//! mutation funnels through its methods.

use crate::aggregation::{
    AggregationStrategy, ModelUpdate, PlainAverage, ProximalAverage, TrimmedRobustAverage,
};
use crate::core::{now, Error, Result, Timestamp, TrainingSample};
use crate::monitoring::{EngineStatus, RoundObserver, RoundSnapshot};
use crate::participant::Participant;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One completed federated round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Record id
    pub id: Uuid,
    /// Round number (1-based, strictly increasing)
    pub round: u32,
    /// Completion time
    pub timestamp: Timestamp,
    /// Ids of participants whose updates were aggregated
    pub participants: Vec<String>,
    /// Sum of aggregated updates' sample counts
    pub total_samples: u64,
    /// Strategy that produced the aggregate
    pub strategy: String,
    /// The aggregated update
    pub aggregate: ModelUpdate,
}

impl From<&RoundRecord> for RoundSnapshot {
    fn from(record: &RoundRecord) -> Self {
        Self {
            round: record.round,
            timestamp: record.timestamp,
            participant_count: record.participants.len(),
            total_samples: record.total_samples,
            strategy: record.strategy.clone(),
        }
    }
}

/// Coordinator lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Between rounds
    Idle,
    /// A round is currently executing
    RoundInProgress,
    /// Stopped; no further rounds will run
    Stopped,
}

/// Coordinator configuration.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Local training epochs per round
    pub epochs: usize,
    /// Rounds kept in the status snapshot
    pub snapshot_window: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            snapshot_window: 10,
        }
    }
}

/// Orchestrates federated rounds across registered participants.
pub struct Coordinator {
    config: CoordinatorConfig,
    participants: RwLock<HashMap<String, Arc<Mutex<Participant>>>>,
    strategies: RwLock<HashMap<&'static str, Arc<dyn AggregationStrategy>>>,
    active_strategy: RwLock<&'static str>,
    global: RwLock<Option<ModelUpdate>>,
    history: RwLock<Vec<RoundRecord>>,
    observers: RwLock<Vec<Arc<dyn RoundObserver>>>,
    in_progress: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl Coordinator {
    /// Create a coordinator with the built-in strategies and plain
    /// averaging active.
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Create with explicit configuration.
    pub fn with_config(config: CoordinatorConfig) -> Self {
        let mut strategies: HashMap<&'static str, Arc<dyn AggregationStrategy>> = HashMap::new();
        let fedavg: Arc<dyn AggregationStrategy> = Arc::new(PlainAverage::new());
        let active = fedavg.name();
        strategies.insert(fedavg.name(), fedavg);
        let fedprox: Arc<dyn AggregationStrategy> = Arc::new(ProximalAverage::default());
        strategies.insert(fedprox.name(), fedprox);
        let trimmed: Arc<dyn AggregationStrategy> = Arc::new(TrimmedRobustAverage::default());
        strategies.insert(trimmed.name(), trimmed);

        let (stop_tx, _) = watch::channel(false);

        Self {
            config,
            participants: RwLock::new(HashMap::new()),
            strategies: RwLock::new(strategies),
            active_strategy: RwLock::new(active),
            global: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            in_progress: AtomicBool::new(false),
            stop_tx,
        }
    }

    /// Register a participant. Ids must be unique.
    pub async fn register_participant(&self, participant: Participant) -> Result<()> {
        let mut participants = self.participants.write().await;
        let id = participant.id().to_string();
        if participants.contains_key(&id) {
            return Err(Error::DuplicateParticipant(id));
        }

        info!(participant = %id, kind = %participant.kind(), "participant registered");
        participants.insert(id, Arc::new(Mutex::new(participant)));
        Ok(())
    }

    /// Append a data batch to a registered participant.
    pub async fn add_data(&self, participant_id: &str, batch: Vec<TrainingSample>) -> Result<()> {
        let cell = {
            let participants = self.participants.read().await;
            participants
                .get(participant_id)
                .cloned()
                .ok_or_else(|| Error::UnknownParticipant(participant_id.to_string()))?
        };

        cell.lock().await.add_data(batch);
        Ok(())
    }

    /// Register an additional aggregation strategy under its own name.
    pub async fn register_strategy(&self, strategy: Arc<dyn AggregationStrategy>) {
        let mut strategies = self.strategies.write().await;
        strategies.insert(strategy.name(), strategy);
    }

    /// Switch the active strategy for subsequent rounds.
    ///
    /// Recorded history is unaffected; an unknown name leaves the active
    /// strategy unchanged.
    pub async fn set_strategy(&self, name: &str) -> Result<()> {
        let strategies = self.strategies.read().await;
        let Some(strategy) = strategies.get(name) else {
            return Err(Error::UnknownStrategy(name.to_string()));
        };

        let mut active = self.active_strategy.write().await;
        *active = strategy.name();
        info!(strategy = name, "aggregation strategy switched");
        Ok(())
    }

    /// Names of all registered strategies, sorted.
    pub async fn strategy_names(&self) -> Vec<String> {
        let strategies = self.strategies.read().await;
        let mut names: Vec<String> = strategies.keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    /// Name of the active strategy.
    pub async fn active_strategy(&self) -> String {
        self.active_strategy.read().await.to_string()
    }

    /// Subscribe an observer to completed-round notifications.
    pub async fn add_observer(&self, observer: Arc<dyn RoundObserver>) {
        self.observers.write().await.push(observer);
    }

    /// Run one federated round.
    ///
    /// Returns `Ok(false)` without recording anything when the coordinator
    /// is stopped, another round is in flight, no participants are
    /// registered, or every participant failed local training.
    pub async fn run_round(&self) -> Result<bool> {
        if self.is_stopped() {
            warn!("coordinator is stopped; round skipped");
            return Ok(false);
        }
        if self.in_progress.swap(true, Ordering::SeqCst) {
            warn!("a round is already in flight; round skipped");
            return Ok(false);
        }

        let outcome = self.execute_round().await;
        self.in_progress.store(false, Ordering::SeqCst);
        outcome
    }

    async fn execute_round(&self) -> Result<bool> {
        let cells: Vec<(String, Arc<Mutex<Participant>>)> = {
            let participants = self.participants.read().await;
            participants
                .iter()
                .map(|(id, cell)| (id.clone(), cell.clone()))
                .collect()
        };
        if cells.is_empty() {
            debug!("no participants registered; round skipped");
            return Ok(false);
        }

        let round = {
            let history = self.history.read().await;
            (history.len() + 1) as u32
        };
        info!(round, participants = cells.len(), "starting federated round");

        let global = self.global.read().await.clone();
        let epochs = self.config.epochs;

        // Barrier: aggregation starts only after every selected participant
        // has returned an update or failed.
        let results = join_all(cells.iter().map(|(_, cell)| {
            let cell = cell.clone();
            let global = global.clone();
            async move {
                let mut participant = cell.lock().await;
                participant.local_train(global.as_ref(), epochs).await
            }
        }))
        .await;

        let mut updates = Vec::new();
        for ((id, _), result) in cells.iter().zip(results) {
            match result {
                Ok(update) if update.sample_count > 0 => updates.push(update),
                Ok(_) => debug!(participant = %id, "zero-sample update excluded"),
                Err(error) => warn!(participant = %id, %error, "local training failed"),
            }
        }
        if updates.is_empty() {
            warn!(round, "no usable updates; round abandoned");
            return Ok(false);
        }

        let (strategy, strategy_name) = {
            let active = *self.active_strategy.read().await;
            let strategies = self.strategies.read().await;
            let strategy = strategies
                .get(active)
                .cloned()
                .ok_or_else(|| Error::UnknownStrategy(active.to_string()))?;
            (strategy, active.to_string())
        };

        let aggregate = strategy.aggregate(&updates);
        let total_samples: u64 = updates.iter().map(|u| u.sample_count).sum();
        let record = RoundRecord {
            id: Uuid::new_v4(),
            round,
            timestamp: now(),
            participants: updates.iter().map(|u| u.participant_id.clone()).collect(),
            total_samples,
            strategy: strategy_name.clone(),
            aggregate: aggregate.clone(),
        };

        *self.global.write().await = Some(aggregate);
        let snapshot = RoundSnapshot::from(&record);
        self.history.write().await.push(record);

        info!(
            round,
            total_samples,
            strategy = %strategy_name,
            "federated round completed"
        );

        let observers = self.observers.read().await.clone();
        for observer in observers {
            let snapshot = snapshot.clone();
            tokio::spawn(async move {
                observer.on_round_complete(snapshot).await;
            });
        }

        Ok(true)
    }

    /// Request a cooperative stop, observed at round boundaries.
    pub fn stop(&self) {
        info!("coordinator stop requested");
        self.stop_tx.send_replace(true);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Receiver resolving when a stop is requested.
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        if self.is_stopped() {
            CoordinatorState::Stopped
        } else if self.in_progress.load(Ordering::SeqCst) {
            CoordinatorState::RoundInProgress
        } else {
            CoordinatorState::Idle
        }
    }

    /// Current global model, if any round has completed.
    pub async fn global_model(&self) -> Option<ModelUpdate> {
        self.global.read().await.clone()
    }

    /// Completed round count.
    pub async fn round_count(&self) -> u32 {
        self.history.read().await.len() as u32
    }

    /// Full round history, oldest first.
    pub async fn history(&self) -> Vec<RoundRecord> {
        self.history.read().await.clone()
    }

    /// Registered participant count.
    pub async fn participant_count(&self) -> usize {
        self.participants.read().await.len()
    }

    /// Snapshots of the last `n` rounds, oldest first.
    pub async fn round_snapshots(&self, n: usize) -> Vec<RoundSnapshot> {
        let history = self.history.read().await;
        let skip = history.len().saturating_sub(n);
        history[skip..].iter().map(RoundSnapshot::from).collect()
    }

    /// Current engine status for observability collaborators.
    pub async fn status(&self) -> EngineStatus {
        let recent_rounds = self.round_snapshots(self.config.snapshot_window).await;
        let global = self.global.read().await;

        EngineStatus {
            round: self.round_count().await,
            global_accuracy: global.as_ref().map(|g| g.accuracy).unwrap_or(0.0),
            strategy: self.active_strategy().await,
            training_in_progress: self.in_progress.load(Ordering::SeqCst),
            participant_count: self.participant_count().await,
            recent_rounds,
        }
    }

    /// Participant cells for ensemble prediction.
    pub(crate) async fn participant_cells(&self) -> Vec<Arc<Mutex<Participant>>> {
        let participants = self.participants.read().await;
        participants.values().cloned().collect()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModelKind;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    fn labeled_batch(n: usize) -> Vec<TrainingSample> {
        (0..n)
            .map(|i| {
                let anomalous = i % 2 == 1;
                let base = if anomalous { 0.9 } else { 0.1 };
                TrainingSample::new(vec![base, base + 0.05], anomalous as u8)
            })
            .collect()
    }

    async fn coordinator_with_participants(counts: &[usize]) -> Coordinator {
        let coordinator = Coordinator::new();
        for (i, count) in counts.iter().enumerate() {
            let id = format!("node-{}", i);
            let participant =
                Participant::with_seed(&id, ModelKind::LinearClassifier, i as u64).unwrap();
            coordinator.register_participant(participant).await.unwrap();
            coordinator.add_data(&id, labeled_batch(*count)).await.unwrap();
        }
        coordinator
    }

    #[tokio::test]
    async fn test_round_with_no_participants_fails() {
        let coordinator = Coordinator::new();
        assert!(!coordinator.run_round().await.unwrap());
        assert_eq!(coordinator.round_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let coordinator = Coordinator::new();
        let first = Participant::with_seed("node-1", ModelKind::LinearClassifier, 1).unwrap();
        let second = Participant::with_seed("node-1", ModelKind::AnomalyDetector, 2).unwrap();

        coordinator.register_participant(first).await.unwrap();
        let result = coordinator.register_participant(second).await;
        assert!(matches!(result, Err(Error::DuplicateParticipant(_))));
        assert_eq!(coordinator.participant_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_data_to_unknown_participant_fails() {
        let coordinator = Coordinator::new();
        let result = coordinator.add_data("ghost", labeled_batch(5)).await;
        assert!(matches!(result, Err(Error::UnknownParticipant(_))));
    }

    #[tokio::test]
    async fn test_unknown_strategy_leaves_active_unchanged() {
        let coordinator = Coordinator::new();
        let result = coordinator.set_strategy("median").await;
        assert!(matches!(result, Err(Error::UnknownStrategy(_))));
        assert_eq!(coordinator.active_strategy().await, "fedavg");
    }

    #[tokio::test]
    async fn test_set_strategy_switches() {
        let coordinator = Coordinator::new();
        coordinator.set_strategy("trimmed_mean").await.unwrap();
        assert_eq!(coordinator.active_strategy().await, "trimmed_mean");

        let names = coordinator.strategy_names().await;
        assert_eq!(names, vec!["fedavg", "fedprox", "trimmed_mean"]);
    }

    #[tokio::test]
    async fn test_successful_round_records_history() {
        let coordinator = coordinator_with_participants(&[20, 30, 50]).await;

        assert!(coordinator.run_round().await.unwrap());

        let history = coordinator.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].round, 1);
        assert_eq!(history[0].participants.len(), 3);
        assert_eq!(history[0].total_samples, 100);
        assert_eq!(history[0].strategy, "fedavg");
        assert!(coordinator.global_model().await.is_some());
    }

    #[tokio::test]
    async fn test_round_numbers_strictly_increase() {
        let coordinator = coordinator_with_participants(&[20, 30]).await;

        for _ in 0..4 {
            assert!(coordinator.run_round().await.unwrap());
        }

        let history = coordinator.history().await;
        for (i, record) in history.iter().enumerate() {
            assert_eq!(record.round, (i + 1) as u32);
        }
    }

    #[tokio::test]
    async fn test_all_participants_insufficient_means_empty_round() {
        let coordinator = coordinator_with_participants(&[3, 4]).await;

        assert!(!coordinator.run_round().await.unwrap());
        assert_eq!(coordinator.round_count().await, 0);
        assert!(coordinator.global_model().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_participants_excluded_from_round() {
        let coordinator = coordinator_with_participants(&[20, 4]).await;

        assert!(coordinator.run_round().await.unwrap());

        let history = coordinator.history().await;
        assert_eq!(history[0].participants, vec!["node-0".to_string()]);
        assert_eq!(history[0].total_samples, 20);
    }

    #[tokio::test]
    async fn test_stopped_coordinator_skips_rounds() {
        let coordinator = coordinator_with_participants(&[20]).await;

        coordinator.stop();
        assert_eq!(coordinator.state(), CoordinatorState::Stopped);
        assert!(!coordinator.run_round().await.unwrap());
        assert_eq!(coordinator.round_count().await, 0);
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let coordinator = coordinator_with_participants(&[20, 30]).await;
        coordinator.run_round().await.unwrap();

        let status = coordinator.status().await;
        assert_eq!(status.round, 1);
        assert_eq!(status.participant_count, 2);
        assert_eq!(status.strategy, "fedavg");
        assert!(!status.training_in_progress);
        assert_eq!(status.recent_rounds.len(), 1);
        assert_eq!(status.recent_rounds[0].total_samples, 50);
    }

    struct ChannelObserver {
        tx: mpsc::UnboundedSender<RoundSnapshot>,
    }

    #[async_trait]
    impl RoundObserver for ChannelObserver {
        async fn on_round_complete(&self, snapshot: RoundSnapshot) {
            let _ = self.tx.send(snapshot);
        }
    }

    #[tokio::test]
    async fn test_observers_receive_round_snapshots() {
        let coordinator = coordinator_with_participants(&[20]).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.add_observer(Arc::new(ChannelObserver { tx })).await;

        coordinator.run_round().await.unwrap();

        let snapshot = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.total_samples, 20);
    }

    #[tokio::test]
    async fn test_round_uses_active_strategy() {
        let coordinator = coordinator_with_participants(&[20, 30, 40]).await;
        coordinator.set_strategy("trimmed_mean").await.unwrap();

        coordinator.run_round().await.unwrap();

        let history = coordinator.history().await;
        assert_eq!(history[0].strategy, "trimmed_mean");
    }
}
