//! One seed → one validated [`GeneratedConversation`], or an empty result
//! after exhausting the retry budget.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::calllog::{CallRecord, GptLogger};
use crate::domain::infer_domain_loose;
use crate::model::{GeneratedConversation, Seed, SimulatorMode};
use crate::parser::parse_response;
use crate::prompt::build_generation_prompt;
use crate::provider::{ChatCompleter, ChatMessage, CompletionParams};
use crate::validator::{validate_conversation, ValidationVerdict};

pub struct GenerationOutcome {
    pub conversation: Option<GeneratedConversation>,
}

/// Stable content hash over the seed's serialized exemplar turns plus its
/// index — deterministic across runs and process restarts, unlike a
/// process-local randomized hash.
pub fn based_on_sample_id(seed: &Seed, seed_index: usize) -> String {
    let mut hasher = Sha256::new();
    for turn in &seed.conversations {
        hasher.update(turn.from.as_str().as_bytes());
        hasher.update(turn.value.as_bytes());
    }
    hasher.update(seed_index.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[allow(clippy::too_many_arguments)]
pub async fn generate_conversation(
    seed_index: usize,
    seed: &Seed,
    mode: SimulatorMode,
    completer: &dyn ChatCompleter,
    call_log: Option<&GptLogger>,
    params: CompletionParams,
    retry_attempts: u32,
    cancel: &CancellationToken,
) -> GenerationOutcome {
    let sample_id = based_on_sample_id(seed, seed_index);
    let domain = infer_domain_loose(&seed.system);
    let prompt = build_generation_prompt(seed, mode);
    let tool_schemas = seed.tool_schemas();

    let messages = vec![
        ChatMessage::system("You are a synthetic dialogue generator."),
        ChatMessage::user(prompt.clone()),
    ];

    for attempt in 0..retry_attempts {
        if cancel.is_cancelled() {
            break;
        }

        let start = Instant::now();
        let completion = completer.complete(&messages, params, cancel).await;
        let duration = start.elapsed().as_secs_f64();

        let (response_text, tokens_used, error_message, success) = match &completion {
            Ok(result) => (result.text.clone(), result.tokens_used, None, true),
            Err(e) => (String::new(), None, Some(e.to_string()), false),
        };

        if let Some(logger) = call_log {
            let record = CallRecord {
                timestamp: Utc::now().to_rfc3339(),
                sample_id: sample_id.clone(),
                attempt,
                duration_seconds: duration,
                tokens_used,
                metadata: HashMap::new(),
                prompt: prompt.clone(),
                response: response_text.clone(),
                error: error_message,
                success,
            };
            let _ = logger.log_call(record).await;
        }

        let Ok(completion) = completion else {
            continue;
        };

        let parsed = parse_response(&completion.text);
        if parsed.count == 0 {
            continue;
        }

        match validate_conversation(&parsed.turns, &tool_schemas) {
            ValidationVerdict::Valid(turns) => {
                return GenerationOutcome {
                    conversation: Some(GeneratedConversation {
                        sample_turns: seed.conversations.len(),
                        generated_turns: turns.len(),
                        conversations: turns,
                        tools: seed.tools.clone(),
                        system: seed.system.clone(),
                        based_on_sample: sample_id,
                        domain: domain.as_str().to_string(),
                        simulator_mode: mode,
                    }),
                };
            }
            ValidationVerdict::Discard(_) => continue,
        }
    }

    GenerationOutcome { conversation: None }
}
