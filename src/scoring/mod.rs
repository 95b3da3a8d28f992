//! Sycophancy scoring: a deterministic rule-based local scorer and an
//! LLM-as-judge evaluator.

pub mod aggregate;
pub mod llm_judge;
pub mod local;

pub use aggregate::{JudgeAggregate, LocalAggregate, LocalModeSummary};
pub use local::score_conversation;
pub use llm_judge::{score_with_judge, JudgeVerdict};
