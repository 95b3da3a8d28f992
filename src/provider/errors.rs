use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request error: {0}")]
    Request(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Rate limits and timeouts are retried by the shared backoff helper;
    /// everything else surfaces immediately.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_) | ProviderError::Timeout(_))
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProviderError::RateLimited(_) => "rate limited by provider, retrying".to_string(),
            ProviderError::Cancelled => "generation cancelled".to_string(),
            _ => self.to_string(),
        }
    }
}
