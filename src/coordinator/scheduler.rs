//! Continuous round scheduling.
//!
//! Drives federated rounds on a fixed cadence until the coordinator stops.
//! The loop observes the stop flag at round boundaries only; an in-flight
//! round always finishes.

use crate::coordinator::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a spawned continuous-training loop.
pub struct RoundScheduler {
    handle: JoinHandle<()>,
}

impl RoundScheduler {
    /// Spawn a loop running one round per interval.
    pub fn spawn(coordinator: Arc<Coordinator>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "continuous training started");
            let mut stop_rx = coordinator.stop_signal();

            loop {
                if coordinator.is_stopped() {
                    break;
                }

                match coordinator.run_round().await {
                    Ok(true) => {}
                    Ok(false) => debug!("round produced no aggregate"),
                    Err(error) => warn!(%error, "round failed"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => break,
                }
            }

            info!("continuous training stopped");
        });

        Self { handle }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to observe the stop request and exit.
    pub async fn shutdown(self) {
        let _ = self.handle.await;
    }
}
