//! One module per CLI subcommand.

pub mod generate;
pub mod log_stats;
pub mod score_llm;
pub mod score_local;
