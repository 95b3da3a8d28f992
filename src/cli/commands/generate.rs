//! `tau2gen generate`: drive the Parallel Orchestrator end to end and write
//! the committed checkpoint out as the final output file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::calllog::GptLogger;
use crate::checkpoint::ProgressStore;
use crate::config::{Config, Credentials};
use crate::observability::{events, Logger};
use crate::orchestration::{Orchestrator, ResumeChoice};
use crate::provider::OpenAiCompleter;
use crate::retry::RetryPolicy;
use crate::seed::SeedStore;

use super::super::error::CliResult;
use super::super::GenerateArgs;

pub async fn run(args: GenerateArgs, config: Config, json_output: bool) -> CliResult<()> {
    config.validate().context("invalid configuration")?;

    let logger = Logger::create(".tau2gen/session.log", !json_output)
        .context("failed to open session log")?;
    events::startup(&logger, args.config.as_ref().map(|p| p.to_string_lossy().to_string()).as_deref());

    let fingerprint = config.fingerprint();
    events::config_loaded(&logger, &fingerprint);

    let seeds = Arc::new(SeedStore::load(&args.input).context("failed to load seed file")?);

    let credentials = Credentials::from_env().context("failed to read provider credentials")?;
    let retry_policy = RetryPolicy::new(
        config.generation.retry_attempts.max(1),
        Duration::from_secs(1),
        Duration::from_secs(30),
    );
    let completer: Arc<dyn crate::provider::ChatCompleter> = Arc::new(
        OpenAiCompleter::new(credentials).with_retry_policy(retry_policy),
    );

    let call_log_path = PathBuf::from(&config.call_log.log_dir).join(
        config
            .call_log
            .log_filename
            .replace("{timestamp}", &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()),
    );
    let call_log = Arc::new(
        GptLogger::create(&call_log_path, &config.provider.api_type, &config.provider.model)
            .await
            .context("failed to open call log")?,
    );

    let checkpoint_path = PathBuf::from(&config.output.output_dir).join(".checkpoint.json");
    if !args.resume && checkpoint_path.exists() {
        std::fs::remove_file(&checkpoint_path).context("failed to clear checkpoint for --no-resume")?;
    }
    let progress_store = ProgressStore::new(&checkpoint_path);

    let orchestrator = Orchestrator::new(
        Arc::clone(&seeds),
        completer,
        Some(Arc::clone(&call_log)),
        progress_store,
        config.clone(),
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let summary = orchestrator
        .run(ResumeChoice::Auto, cancel)
        .await
        .context("generation run failed")?;

    events::shutdown(&logger, summary.succeeded, summary.failed);

    let output_path = &args.output;
    let text = serde_json::to_string_pretty(&summary.record.completed)
        .context("failed to serialize generated conversations")?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("failed to create output directory")?;
        }
    }
    std::fs::write(output_path, text).context("failed to write output file")?;

    if json_output {
        let summary_json = serde_json::json!({
            "completed": summary.record.completed.len(),
            "target": summary.record.target_count,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "output": output_path,
        });
        println!("{summary_json}");
    } else {
        println!(
            "{} {} conversations written to {}",
            "done:".green().bold(),
            summary.record.completed.len(),
            output_path.display()
        );
        if summary.failed > 0 {
            println!("{} {} generation attempts failed", "warning:".yellow().bold(), summary.failed);
        }
    }

    Ok(())
}
