use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),

    #[error(transparent)]
    CallLog(#[from] crate::calllog::CallLogError),
}

impl OrchestratorError {
    /// Checkpoint write failures are fatal; everything else is recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, OrchestratorError::Checkpoint(_))
    }
}
