//! Progress Store (C2): the durable checkpoint file holding a
//! [`CheckpointRecord`], plus resume/backup semantics.

use std::path::{Path, PathBuf};

use crate::model::{CheckpointRecord, GeneratedConversation};

use super::atomic::AtomicOps;
use super::errors::{CheckpointError, CheckpointResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintStatus {
    /// No checkpoint existed yet.
    Fresh,
    Matches,
    Mismatch,
}

pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the checkpoint (empty if the file doesn't exist yet) and
    /// whether its fingerprint matches the current config.
    pub fn load(
        &self,
        target_count: usize,
        current_fingerprint: &str,
    ) -> CheckpointResult<(CheckpointRecord, FingerprintStatus)> {
        if !self.path.exists() {
            return Ok((
                CheckpointRecord::empty(target_count, current_fingerprint.to_string()),
                FingerprintStatus::Fresh,
            ));
        }
        let record: CheckpointRecord = AtomicOps::read_json(&self.path).map_err(|e| {
            CheckpointError::corrupted(format!("failed to parse checkpoint: {e}"))
        })?;
        let status = if record.config_fingerprint == current_fingerprint {
            FingerprintStatus::Matches
        } else {
            FingerprintStatus::Mismatch
        };
        Ok((record, status))
    }

    /// Append a batch of newly completed conversations and commit the whole
    /// document atomically (write-temp-rename, same filesystem as the
    /// target).
    pub fn append_batch(
        &self,
        record: &mut CheckpointRecord,
        batch: Vec<GeneratedConversation>,
    ) -> CheckpointResult<()> {
        record.completed.extend(batch);
        AtomicOps::write_json(&self.path, record)
    }

    /// Rename the current checkpoint aside with a timestamp suffix, used on
    /// fingerprint mismatch before starting fresh.
    pub fn backup(&self, suffix: &str) -> CheckpointResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup_path = self.backup_path(suffix);
        std::fs::rename(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }

    fn backup_path(&self, suffix: &str) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "checkpoint.json".to_string());
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{filename}.{suffix}.bak"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, SimulatorMode, Turn};
    use tempfile::tempdir;

    fn sample_conversation() -> GeneratedConversation {
        GeneratedConversation {
            conversations: vec![Turn::new(Role::Human, "hi")],
            tools: "[]".to_string(),
            system: "system text".to_string(),
            based_on_sample: "abc123".to_string(),
            sample_turns: 1,
            generated_turns: 1,
            domain: "other".to_string(),
            simulator_mode: SimulatorMode::Base,
        }
    }

    #[test]
    fn load_absent_checkpoint_is_fresh() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("checkpoint.json"));
        let (record, status) = store.load(10, "fp1").unwrap();
        assert_eq!(status, FingerprintStatus::Fresh);
        assert!(record.completed.is_empty());
    }

    #[test]
    fn append_batch_then_reload_matches_fingerprint() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("checkpoint.json"));
        let (mut record, _) = store.load(10, "fp1").unwrap();
        store
            .append_batch(&mut record, vec![sample_conversation()])
            .unwrap();

        let (reloaded, status) = store.load(10, "fp1").unwrap();
        assert_eq!(status, FingerprintStatus::Matches);
        assert_eq!(reloaded.completed.len(), 1);
    }

    #[test]
    fn fingerprint_mismatch_is_detected() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("checkpoint.json"));
        let (mut record, _) = store.load(10, "fp1").unwrap();
        store.append_batch(&mut record, vec![]).unwrap();

        let (_, status) = store.load(10, "fp2").unwrap();
        assert_eq!(status, FingerprintStatus::Mismatch);
    }

    #[test]
    fn backup_renames_existing_file_aside() {
        let dir = tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("checkpoint.json"));
        let (mut record, _) = store.load(10, "fp1").unwrap();
        store.append_batch(&mut record, vec![]).unwrap();

        let backup = store.backup("20260101_000000").unwrap().unwrap();
        assert!(backup.exists());
        assert!(!store.path().exists());
    }
}
