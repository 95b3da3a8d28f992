//! `tau2gen log-stats`: print or export Call Log statistics for a given log file.

use anyhow::Context;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::calllog::GptLogger;

use super::super::error::CliResult;
use super::super::LogStatsArgs;

pub async fn run(args: LogStatsArgs, json_output: bool) -> CliResult<()> {
    let logger = GptLogger::create(&args.input, "openai", "unknown")
        .await
        .context("failed to open call log")?;
    let stats = logger.stats().context("failed to compute call log statistics")?;

    if let Some(export_path) = &args.export {
        logger
            .export_summary(export_path)
            .await
            .context("failed to export call log summary")?;
    }

    if json_output {
        println!(
            "{}",
            serde_json::to_string(&stats).context("failed to serialize stats")?
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["metric", "value"]);
    table.add_row(vec![Cell::new("total calls"), Cell::new(stats.total_calls)]);
    table.add_row(vec![Cell::new("successful"), Cell::new(stats.successful_calls)]);
    table.add_row(vec![Cell::new("failed"), Cell::new(stats.failed_calls)]);
    table.add_row(vec![
        Cell::new("success rate"),
        Cell::new(format!("{:.1}%", stats.success_rate * 100.0)),
    ]);
    table.add_row(vec![
        Cell::new("total duration (s)"),
        Cell::new(format!("{:.1}", stats.total_duration_seconds)),
    ]);
    table.add_row(vec![Cell::new("total tokens"), Cell::new(stats.total_tokens_used)]);
    table.add_row(vec![Cell::new("retried attempts"), Cell::new(stats.retry_attempt_count)]);
    table.add_row(vec![Cell::new("unique samples"), Cell::new(stats.unique_sample_count)]);
    println!("{table}");

    if !stats.top_error_messages.is_empty() {
        println!("{}", "top errors:".bold());
        for (message, count) in &stats.top_error_messages {
            println!("  {count:>4}  {message}");
        }
    }

    Ok(())
}
