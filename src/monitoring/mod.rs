//! Monitoring Module
//!
//! Observability for the federation engine:
//! - Per-round and current-state snapshots
//! - Fire-and-forget round observers
//! - Tracing subscriber setup

pub mod logging;
pub mod snapshot;

pub use snapshot::{EngineStatus, RoundObserver, RoundSnapshot};
