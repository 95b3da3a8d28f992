//! Conversation Generator (C8): composes the Prompt Builder, ChatCompleter,
//! Response Parser, and Tool Validator into one per-seed pipeline.

pub mod conversation_generator;

pub use conversation_generator::{generate_conversation, GenerationOutcome};
