//! Prompt Builder: domain-aware, mode-aware generation prompts.

pub mod builder;

pub use builder::build_generation_prompt;
