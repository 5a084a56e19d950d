//! Datagen Module
//!
//! Synthetic data for exercising the federation:
//! - Seeded NSL-KDD-like traffic generation
//! - Non-IID partitioning across participants
//! - Local data distribution analysis

pub mod partition;
pub mod traffic;

pub use partition::{partition_non_iid, DataDistribution};
pub use traffic::{TrafficGenerator, FEATURE_COUNT};
