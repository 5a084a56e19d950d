//! Coordinator Module
//!
//! Federated round orchestration:
//! - Participant and strategy registries
//! - Round lifecycle with a concurrent-training barrier
//! - Append-only round history and global model state
//! - Continuous-round scheduling with cooperative stop

pub mod coordinator;
pub mod scheduler;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorState, RoundRecord};
pub use scheduler::RoundScheduler;
