//! Error types for fedsentry.

use thiserror::Error;

/// Result type alias for fedsentry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fedsentry operations.
#[derive(Error, Debug)]
pub enum Error {
    // Participant errors
    #[error("Participant {id}: insufficient data ({have} samples, {need} required)")]
    InsufficientData {
        id: String,
        have: usize,
        need: usize,
    },

    #[error("Participant {0} has no trained model")]
    NotTrained(String),

    #[error("Participant id already registered: {0}")]
    DuplicateParticipant(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    // Strategy errors
    #[error("Unknown aggregation strategy: {0}")]
    UnknownStrategy(String),

    // Configuration errors
    #[error("Privacy budget must be positive, got epsilon = {0}")]
    InvalidPrivacyBudget(f32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
