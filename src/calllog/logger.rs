//! `GptLogger`: an append-only JSONL sink for every LLM call, with a header
//! line written once and a mutex serializing concurrent writers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::error::CallLogResult;

/// One JSONL record: one LLM call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: String,
    pub sample_id: String,
    pub attempt: u32,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub prompt: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

pub struct GptLogger {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl GptLogger {
    /// Open (or create) the log file at `path`. Writes the header line only
    /// if the file did not already exist, so resuming a run appends instead
    /// of re-headering.
    pub async fn create(path: impl Into<PathBuf>, api_type: &str, model: &str) -> CallLogResult<Self> {
        let path = path.into();
        let is_new = !path.exists();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        if is_new {
            let header = json!({
                "log_type": "gpt_outputs",
                "created_at": Utc::now().to_rfc3339(),
                "config": { "api_type": api_type, "model": model },
            });
            let line = format!("{}\n", serde_json::to_string(&header)?);
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Append one call record, fully serialized before the lock is released.
    pub async fn log_call(&self, record: CallRecord) -> CallLogResult<()> {
        let line = format!("{}\n", serde_json::to_string(&record)?);
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn read_lines(&self) -> CallLogResult<Vec<String>> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text.lines().map(|l| l.to_string()).collect())
    }

    fn read_records(&self) -> CallLogResult<Vec<CallRecord>> {
        let lines = self.read_lines()?;
        Ok(lines
            .iter()
            .skip(1) // header line
            .filter_map(|l| serde_json::from_str::<CallRecord>(l).ok())
            .collect())
    }

    /// Aggregate statistics over every record currently on disk.
    pub fn stats(&self) -> CallLogResult<CallLogStats> {
        let records = self.read_records()?;
        let total = records.len();
        let successful = records.iter().filter(|r| r.success).count();
        let failed = total - successful;
        let total_duration: f64 = records.iter().map(|r| r.duration_seconds).sum();
        let total_tokens: u64 = records.iter().filter_map(|r| r.tokens_used).sum();
        let retry_attempts = records.iter().filter(|r| r.attempt > 0).count();
        let unique_samples: std::collections::HashSet<&str> =
            records.iter().map(|r| r.sample_id.as_str()).collect();

        let mut error_counts: HashMap<String, usize> = HashMap::new();
        for r in records.iter().filter_map(|r| r.error.as_ref()) {
            *error_counts.entry(r.clone()).or_insert(0) += 1;
        }
        let mut top_errors: Vec<(String, usize)> = error_counts.into_iter().collect();
        top_errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_errors.truncate(10);

        Ok(CallLogStats {
            total_calls: total,
            successful_calls: successful,
            failed_calls: failed,
            total_duration_seconds: total_duration,
            average_duration_seconds: if total > 0 {
                total_duration / total as f64
            } else {
                0.0
            },
            total_tokens_used: total_tokens,
            retry_attempt_count: retry_attempts,
            unique_sample_count: unique_samples.len(),
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
            top_error_messages: top_errors,
        })
    }

    /// Write a JSON summary document: header, `stats()`, and a redacted
    /// detail list (lengths only, never prompt/response content).
    pub async fn export_summary(&self, out_path: &Path) -> CallLogResult<()> {
        let lines = self.read_lines()?;
        let header: serde_json::Value = lines
            .first()
            .and_then(|l| serde_json::from_str(l).ok())
            .unwrap_or_else(|| json!({}));
        let stats = self.stats()?;
        let records = self.read_records()?;
        let redacted: Vec<serde_json::Value> = records
            .iter()
            .map(|r| {
                json!({
                    "sample_id": r.sample_id,
                    "attempt": r.attempt,
                    "success": r.success,
                    "prompt_len": r.prompt.len(),
                    "response_len": r.response.len(),
                })
            })
            .collect();
        let summary = json!({
            "header": header,
            "stats": stats,
            "details": redacted,
        });
        let text = serde_json::to_string_pretty(&summary)?;
        tokio::fs::write(out_path, text).await?;
        Ok(())
    }

    /// Timestamp-suffixed copy of the log file, analogous to the Progress
    /// Store's `backup`.
    pub async fn backup(&self, suffix: &str) -> CallLogResult<PathBuf> {
        let filename = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "gpt_calls.jsonl".to_string());
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let backup_path = parent.join(format!("{filename}.{suffix}.bak"));
        tokio::fs::copy(&self.path, &backup_path).await?;
        Ok(backup_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogStats {
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
    pub total_tokens_used: u64,
    pub retry_attempt_count: usize,
    pub unique_sample_count: usize,
    pub success_rate: f64,
    pub top_error_messages: Vec<(String, usize)>,
}
