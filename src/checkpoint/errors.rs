//! Error types for the Progress Store (checkpoint) system.

use thiserror::Error;

/// Result type for checkpoint operations.
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors produced while loading, validating, or writing the checkpoint file.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("corrupted checkpoint data: {message}")]
    CorruptedData { message: String },

    #[error("config fingerprint mismatch: checkpoint was built with {found}, current config is {expected}")]
    FingerprintMismatch { expected: String, found: String },

    #[error("other error: {message}")]
    Other { message: String },
}

impl CheckpointError {
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn corrupted<S: Into<String>>(message: S) -> Self {
        Self::CorruptedData {
            message: message.into(),
        }
    }

    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Fatal errors abort the orchestrator; everything else is recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CheckpointError::Io(_) | CheckpointError::Storage { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckpointError::FingerprintMismatch { expected, found } => format!(
                "checkpoint config fingerprint {found} does not match current config {expected}; back up the old checkpoint and restart, or change config back"
            ),
            CheckpointError::CorruptedData { message } => {
                format!("checkpoint file is corrupted ({message}); delete it to start fresh")
            }
            _ => self.to_string(),
        }
    }
}
