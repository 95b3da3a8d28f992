//! The `ChatCompleter` contract: messages in, text + usage + elapsed out.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::errors::ProviderResult;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub text: String,
    pub tokens_used: Option<u64>,
    pub elapsed: Duration,
}

/// Abstract single-shot chat completion. Implementations must retry
/// internally on rate-limit and transient network errors with exponential
/// backoff and jitter; final failure surfaces as [`super::errors::ProviderError`].
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
        cancel: &CancellationToken,
    ) -> ProviderResult<CompletionResult>;
}
