//! Session-lifecycle logging, independent of the Call Log's per-call sink.

pub mod logger;

pub use logger::{events, Level, Logger};
