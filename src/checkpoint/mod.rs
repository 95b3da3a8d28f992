//! Progress Store: durable, resumable checkpointing of generated
//! conversations.

pub mod atomic;
pub mod errors;
pub mod store;

pub use atomic::{AtomicFileWriter, AtomicOps, FileLock};
pub use errors::{CheckpointError, CheckpointResult};
pub use store::{FingerprintStatus, ProgressStore};
