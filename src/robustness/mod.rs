//! Robustness Module
//!
//! Byzantine-participant detection:
//! - Norm-based statistical outlier flagging (advisory)
//! - Shared L2 norm helper for aggregation strategies

pub mod analyzer;

pub use analyzer::{l2_norm, RobustnessAnalyzer};
