//! OpenAI-compatible HTTP chat-completions implementation of [`ChatCompleter`].

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::config::Credentials;
use crate::retry::{retry, RetryPolicy};

use super::errors::{ProviderError, ProviderResult};
use super::traits::{ChatCompleter, ChatMessage, CompletionParams, CompletionResult};

pub struct OpenAiCompleter {
    client: reqwest::Client,
    credentials: Credentials,
    retry_policy: RetryPolicy,
}

impl OpenAiCompleter {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn attempt_once(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
        cancel: &CancellationToken,
    ) -> ProviderResult<CompletionResult> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let body = json!({
            "model": self.credentials.model,
            "messages": messages.iter().map(|m| json!({"role": m.role, "content": m.content})).collect::<Vec<_>>(),
            "temperature": params.temperature,
            "max_tokens": params.max_output_tokens,
        });

        let start = Instant::now();
        let url = format!("{}/chat/completions", self.credentials.base_url.trim_end_matches('/'));

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.credentials.api_key)
            .json(&body)
            .timeout(params.timeout);

        let response = tokio::select! {
            result = request.send() => result.map_err(|e| ProviderError::Request(e.to_string()))?,
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited(
                "provider returned 429".to_string(),
            ));
        }
        if status.is_server_error() {
            return Err(ProviderError::RateLimited(format!(
                "provider returned {status}"
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!("{status}: {text}")));
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        Ok(CompletionResult {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
            elapsed: start.elapsed(),
        })
    }
}

#[async_trait]
impl ChatCompleter for OpenAiCompleter {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
        cancel: &CancellationToken,
    ) -> ProviderResult<CompletionResult> {
        retry(self.retry_policy, |_attempt| {
            self.attempt_once(messages, params, cancel)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use std::time::Duration;

    fn completer() -> OpenAiCompleter {
        OpenAiCompleter::new(Credentials {
            api_key: "sk-test".to_string(),
            base_url: "http://127.0.0.1:0".to_string(),
            model: "gpt-4o-mini".to_string(),
        })
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_any_request() {
        let completer = completer();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let params = CompletionParams {
            temperature: 1.0,
            max_output_tokens: 100,
            timeout: Duration::from_secs(1),
        };
        let result = completer
            .attempt_once(&[ChatMessage::user("hi")], params, &cancel)
            .await;
        assert!(matches!(result, Err(ProviderError::Cancelled)));
    }
}
