//! `tau2gen score-llm`: run the LLM-as-Judge scorer over a generated output
//! file, appending one JSONL record per conversation and resuming from any
//! prior partial run.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Credentials;
use crate::model::GeneratedConversation;
use crate::provider::{ChatCompleter, CompletionParams, OpenAiCompleter};
use crate::retry::RetryPolicy;
use crate::scoring::{score_with_judge, JudgeAggregate, JudgeVerdict};

use super::super::error::CliResult;
use super::super::ScoreLlmArgs;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JudgeRecord {
    conv_idx: usize,
    #[serde(flatten)]
    verdict: JudgeVerdict,
}

pub async fn run(args: ScoreLlmArgs, json_output: bool) -> CliResult<()> {
    let text = std::fs::read_to_string(&args.input).context("failed to read output file")?;
    let conversations: Vec<GeneratedConversation> =
        serde_json::from_str(&text).context("output file is not a JSON array of conversations")?;

    let mut existing: HashMap<usize, JudgeRecord> = HashMap::new();
    if args.output.exists() {
        let file = std::fs::File::open(&args.output).context("failed to open existing judge log")?;
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            if let Ok(record) = serde_json::from_str::<JudgeRecord>(&line) {
                if record.verdict.error.is_none() {
                    existing.insert(record.conv_idx, record);
                }
            }
        }
    }

    let credentials = Credentials::from_env().context("failed to read provider credentials")?;
    let retry_policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30));
    let completer: Arc<dyn ChatCompleter> =
        Arc::new(OpenAiCompleter::new(credentials).with_retry_policy(retry_policy));
    let params = CompletionParams {
        temperature: 0.0,
        max_output_tokens: 800,
        timeout: Duration::from_secs(60),
    };
    let cancel = CancellationToken::new();

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("failed to create judge log directory")?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.output)
        .context("failed to open judge log for appending")?;

    let mut verdicts: Vec<JudgeVerdict> = Vec::with_capacity(conversations.len());
    for (conv_idx, conversation) in conversations.iter().enumerate() {
        if let Some(record) = existing.get(&conv_idx) {
            verdicts.push(record.verdict.clone());
            continue;
        }
        let verdict = score_with_judge(
            conv_idx,
            conversation,
            completer.as_ref(),
            params,
            retry_policy,
            &cancel,
        )
        .await;
        let record = JudgeRecord {
            conv_idx,
            verdict: verdict.clone(),
        };
        let line = serde_json::to_string(&record).context("failed to serialize judge record")?;
        use std::io::Write;
        writeln!(file, "{line}").context("failed to append judge record")?;
        verdicts.push(verdict);
    }

    let aggregate = JudgeAggregate::build(&verdicts);
    if let Some(summary_path) = &args.summary {
        let summary_text =
            serde_json::to_string_pretty(&aggregate).context("failed to serialize judge summary")?;
        std::fs::write(summary_path, summary_text).context("failed to write judge summary")?;
    }

    if json_output {
        println!(
            "{}",
            serde_json::to_string(&aggregate).context("failed to serialize judge summary")?
        );
    } else if let Some(aggregate) = aggregate {
        println!(
            "{} {} conversations scored, mean wm_sycophancy_score {:.1}",
            "done:".green().bold(),
            aggregate.count,
            aggregate.mean
        );
    } else {
        println!("{}", "no conversations produced a usable verdict".yellow());
    }

    Ok(())
}
