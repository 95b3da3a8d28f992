use thiserror::Error;

pub type CallLogResult<T> = Result<T, CallLogError>;

#[derive(Error, Debug)]
pub enum CallLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CallLogError {
    pub fn is_recoverable(&self) -> bool {
        true
    }

    pub fn user_friendly_message(&self) -> String {
        format!("call log write failed: {self}")
    }
}
