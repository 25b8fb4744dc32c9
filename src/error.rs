use thiserror::Error;

use crate::types::JointKind;

/// Stamp tracker error types
#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("Invalid {joint:?} sample at t={timestamp}: {reason}")]
    InvalidSample {
        joint: JointKind,
        timestamp: i64,
        reason: String,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Evaluation worker stopped: {0}")]
    WorkerStopped(String),

    #[error("Recording parse error at line {line}: {source}")]
    RecordingParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for recognizer operations
pub type Result<T> = std::result::Result<T, RecognizerError>;
