//! Call Log: append-only JSONL sink for every LLM request/response.

pub mod error;
pub mod logger;

pub use error::{CallLogError, CallLogResult};
pub use logger::{CallLogStats, CallRecord, GptLogger};
