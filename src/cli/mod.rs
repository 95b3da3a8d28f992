//! `tau2gen`: the crate's single binary entrypoint. One subcommand per
//! ambient operation (generation, both scorers, call-log statistics), plus a
//! default `generate` invocation when no subcommand is named.

pub mod commands;
pub mod error;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::config::{Config, ConfigurationLoader};

pub use error::{CliError, CliResult};

#[derive(Debug, Parser)]
#[command(name = "tau2gen", about = "Synthetic tool-use dialogue generation and scoring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Machine-readable JSON on stdout instead of a human-readable table.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate synthetic conversations from a seed corpus.
    Generate(GenerateArgs),
    /// Score a generated output file with the deterministic local scorer.
    ScoreLocal(ScoreLocalArgs),
    /// Score a generated output file with the LLM-as-judge scorer.
    ScoreLlm(ScoreLlmArgs),
    /// Print or export Call Log statistics.
    LogStats(LogStatsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Seed corpus file (JSON array of seeds).
    #[arg(long)]
    pub input: PathBuf,
    /// Destination for the generated conversations.
    #[arg(long)]
    pub output: PathBuf,
    #[arg(long)]
    pub target_count: Option<usize>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub batch_size: Option<usize>,
    #[arg(long, value_name = "base|strict|sycophantic")]
    pub simulator_mode: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub temperature: Option<f64>,
    #[arg(long)]
    pub max_tokens: Option<u32>,
    #[arg(long)]
    pub timeout: Option<u64>,
    #[arg(long, overrides_with = "no_resume")]
    pub resume: bool,
    #[arg(long, overrides_with = "resume")]
    pub no_resume: bool,
    /// Optional TOML config file; CLI flags override file values.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScoreLocalArgs {
    /// Generated output file to score.
    #[arg(long)]
    pub input: PathBuf,
    /// Directory to write `sycophancy_local_scores_<mode>.json` into.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScoreLlmArgs {
    /// Generated output file to score.
    #[arg(long)]
    pub input: PathBuf,
    /// JSONL file to append judge verdicts to (resumed if it already exists).
    #[arg(long)]
    pub output: PathBuf,
    /// Optional path to write the aggregate distribution summary.
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct LogStatsArgs {
    /// Call Log JSONL file to summarize.
    #[arg(long)]
    pub input: PathBuf,
    /// Optional path to write a redacted JSON summary document.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl GenerateArgs {
    fn effective_resume(&self) -> bool {
        self.resume && !self.no_resume
    }
}

/// Merge a loaded config file with CLI flag overrides; CLI flags always win.
fn merge_config(mut config: Config, args: &GenerateArgs) -> Config {
    if let Some(target_count) = args.target_count {
        config.generation.target_count = target_count;
    }
    if let Some(workers) = args.workers {
        config.generation.workers = workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.generation.batch_size = batch_size;
    }
    if let Some(mode) = &args.simulator_mode {
        config.generation.simulator_mode = mode.clone();
    }
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        config.generation.temperature = temperature;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.generation.max_tokens = max_tokens;
    }
    if let Some(timeout) = args.timeout {
        config.generation.timeout_secs = timeout;
    }
    config.generation.sample_data_path = args.input.to_string_lossy().to_string();
    config
}

fn load_config(args: &GenerateArgs) -> anyhow::Result<Config> {
    let loader = ConfigurationLoader::new(args.config.as_deref());
    let config = loader.load().context("failed to load config file")?;
    Ok(merge_config(config, args))
}

/// Parse `std::env::args()` and dispatch to the named (or default) subcommand.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json_output = cli.json;

    match cli.command {
        Some(Command::Generate(args)) => run_generate(args, json_output).await,
        Some(Command::ScoreLocal(args)) => {
            commands::score_local::run(args, json_output).map_err(Into::into)
        }
        Some(Command::ScoreLlm(args)) => commands::score_llm::run(args, json_output)
            .await
            .map_err(Into::into),
        Some(Command::LogStats(args)) => commands::log_stats::run(args, json_output)
            .await
            .map_err(Into::into),
        None => run_generate(cli.generate, json_output).await,
    }
}

async fn run_generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let mut args = args;
    args.resume = args.effective_resume();
    let config = load_config(&args).context("failed to load configuration")?;
    commands::generate::run(args, config, json_output)
        .await
        .map_err(Into::into)
}
