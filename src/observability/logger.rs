//! Human-facing lifecycle logger: leveled, timestamped session events routed
//! to a log file and echoed to stderr. Distinct from the Call Log, which
//! records one machine-readable JSONL entry per completion attempt.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// A session-scoped lifecycle logger. Every call appends one line to the
/// session log file and, unless silenced, writes the same line to stderr.
pub struct Logger {
    path: PathBuf,
    file: Mutex<std::fs::File>,
    echo_to_stderr: bool,
}

impl Logger {
    pub fn create(path: impl Into<PathBuf>, echo_to_stderr: bool) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            echo_to_stderr,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message.as_ref());
    }

    fn log(&self, level: Level, message: &str) {
        let redacted = redact_credentials(message);
        let line = format!(
            "[{}] {} {}",
            Utc::now().to_rfc3339(),
            level.as_str(),
            redacted
        );
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
        if self.echo_to_stderr {
            eprintln!("{line}");
        }
    }
}

/// Masks values that look like they came from a credential environment
/// variable or an `Authorization: Bearer ...` header, so stray leaks of a
/// rendered request never land in the session log.
fn redact_credentials(message: &str) -> String {
    let mut redacted = message.to_string();
    for marker in ["Bearer ", "sk-", "api_key="] {
        if let Some(start) = redacted.find(marker) {
            let rest_start = start + marker.len();
            let rest = &redacted[rest_start..];
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
                .map(|i| rest_start + i)
                .unwrap_or(redacted.len());
            redacted.replace_range(rest_start..end, "[redacted]");
        }
    }
    redacted
}

/// Lifecycle event helpers, named after the events §6b calls out explicitly.
pub mod events {
    use super::Logger;

    pub fn startup(logger: &Logger, config_path: Option<&str>) {
        let host = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown-host".to_string());
        match config_path {
            Some(path) => logger.info(format!("startup on {host}: loaded config from {path}")),
            None => logger.info(format!("startup on {host}: using default configuration")),
        }
    }

    pub fn config_loaded(logger: &Logger, fingerprint: &str) {
        logger.info(format!("config loaded, fingerprint {fingerprint}"));
    }

    pub fn checkpoint_resumed(logger: &Logger, completed: usize, target: usize) {
        logger.info(format!("checkpoint resumed: {completed}/{target} already complete"));
    }

    pub fn checkpoint_reset(logger: &Logger, backup_path: Option<&str>) {
        match backup_path {
            Some(path) => logger.warn(format!("checkpoint fingerprint mismatch, backed up to {path}")),
            None => logger.warn("checkpoint fingerprint mismatch, no prior checkpoint to back up"),
        }
    }

    pub fn batch_committed(logger: &Logger, batch_size: usize, total: usize, target: usize) {
        logger.info(format!("batch committed: +{batch_size}, {total}/{target} total"));
    }

    pub fn worker_error(logger: &Logger, detail: &str) {
        logger.error(format!("worker error: {detail}"));
    }

    pub fn shutdown(logger: &Logger, succeeded: usize, failed: usize) {
        logger.info(format!("shutdown: {succeeded} succeeded, {failed} failed"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_leveled_lines_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.log");
        let logger = Logger::create(&path, false).unwrap();
        logger.info("hello");
        logger.warn("careful");
        logger.error("boom");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("INFO hello"));
        assert!(contents.contains("WARN careful"));
        assert!(contents.contains("ERROR boom"));
    }

    #[test]
    fn redacts_bearer_tokens() {
        let redacted = redact_credentials("calling with Authorization: Bearer sk-abcdef123456 now");
        assert!(!redacted.contains("sk-abcdef123456"));
        assert!(redacted.contains("[redacted]"));
    }

    #[test]
    fn redacts_api_key_assignment() {
        let redacted = redact_credentials("loaded api_key=topsecret from env");
        assert!(!redacted.contains("topsecret"));
    }

    #[test]
    fn appends_across_reopen_without_truncating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.log");
        {
            let logger = Logger::create(&path, false).unwrap();
            logger.info("first");
        }
        {
            let logger = Logger::create(&path, false).unwrap();
            logger.info("second");
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("first"));
        assert!(contents.contains("second"));
    }
}
