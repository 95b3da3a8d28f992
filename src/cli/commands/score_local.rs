//! `tau2gen score-local`: run the Local Sycophancy Scorer over a generated
//! output file and write one summary document per simulator mode present.

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::model::{ConversationScore, GeneratedConversation};
use crate::scoring::{score_conversation, LocalAggregate};

use super::super::error::CliResult;
use super::super::ScoreLocalArgs;

pub fn run(args: ScoreLocalArgs, json_output: bool) -> CliResult<()> {
    let text = std::fs::read_to_string(&args.input).context("failed to read output file")?;
    let conversations: Vec<GeneratedConversation> =
        serde_json::from_str(&text).context("output file is not a JSON array of conversations")?;

    let scores: Vec<ConversationScore> = conversations
        .iter()
        .enumerate()
        .map(|(idx, conversation)| score_conversation(conversation, idx))
        .collect();

    let aggregate = LocalAggregate::build(&scores);

    let out_dir = args.output_dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
    for summary in &aggregate.by_mode {
        let filename = LocalAggregate::filename_for(summary.mode);
        let path: &Path = &out_dir.join(&filename);
        let text = serde_json::to_string_pretty(summary).context("failed to serialize mode summary")?;
        std::fs::write(path, text).context("failed to write mode summary")?;
    }

    if json_output {
        println!(
            "{}",
            serde_json::to_string(&aggregate).context("failed to serialize aggregate")?
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["mode", "count", "mean score", "flagged"]);
    for summary in &aggregate.by_mode {
        table.add_row(vec![
            Cell::new(summary.mode.as_str()),
            Cell::new(summary.count),
            Cell::new(format!("{:.1}", summary.mean_score)),
            Cell::new(summary.flagged.len()),
        ]);
    }
    println!("{table}");
    println!("{}", format!("wrote summaries to {}", out_dir.display()).green());

    Ok(())
}
