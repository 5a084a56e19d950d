//! # fedsentry - Federated Learning Intrusion Detection
//!
//! A federated learning engine for collaborative anomaly detection:
//! - **Participants**: private local data and pluggable local models
//! - **Coordinator**: round orchestration with a concurrent-training barrier
//! - **Aggregation**: plain, proximal, and Byzantine-robust trimmed averaging
//! - **Privacy**: differential-privacy noise injection and additive masking
//! - **Ensemble**: majority-vote inference with weighted metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedsentry::coordinator::Coordinator;
//! use fedsentry::core::ModelKind;
//! use fedsentry::datagen::TrafficGenerator;
//! use fedsentry::participant::Participant;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new();
//!     let node = Participant::new("node-1", ModelKind::LinearClassifier).unwrap();
//!     coordinator.register_participant(node).await.unwrap();
//!
//!     let mut generator = TrafficGenerator::new(42);
//!     coordinator
//!         .add_data("node-1", generator.generate(500))
//!         .await
//!         .unwrap();
//!
//!     coordinator.run_round().await.unwrap();
//!     println!("completed rounds: {}", coordinator.round_count().await);
//! }
//! ```

pub mod aggregation;
pub mod coordinator;
pub mod core;
pub mod datagen;
pub mod ensemble;
pub mod monitoring;
pub mod participant;
pub mod privacy;
pub mod robustness;

pub use crate::core::error::{Error, Result};
