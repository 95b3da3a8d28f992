//! Parallel Orchestrator (C9): a resumable, checkpointed worker pool that
//! drives concurrent generation against a `ChatCompleter`.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_util::sync::CancellationToken;

use crate::calllog::GptLogger;
use crate::checkpoint::{FingerprintStatus, ProgressStore};
use crate::config::Config;
use crate::generator::generate_conversation;
use crate::model::{CheckpointRecord, GeneratedConversation, SimulatorMode};
use crate::provider::{ChatCompleter, CompletionParams};
use crate::seed::SeedStore;

use super::error::OrchestratorResult;

/// How to handle a fingerprint mismatch found at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    /// Non-interactive: resume silently on match, back up and restart
    /// silently on mismatch.
    Auto,
    /// Surface the mismatch to the caller instead of deciding silently.
    Interactive,
}

pub struct RunSummary {
    pub record: CheckpointRecord,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Orchestrator {
    seeds: Arc<SeedStore>,
    completer: Arc<dyn ChatCompleter>,
    call_log: Option<Arc<GptLogger>>,
    progress_store: ProgressStore,
    config: Config,
}

impl Orchestrator {
    pub fn new(
        seeds: Arc<SeedStore>,
        completer: Arc<dyn ChatCompleter>,
        call_log: Option<Arc<GptLogger>>,
        progress_store: ProgressStore,
        config: Config,
    ) -> Self {
        Self {
            seeds,
            completer,
            call_log,
            progress_store,
            config,
        }
    }

    pub async fn run(
        &self,
        resume_choice: ResumeChoice,
        cancel: CancellationToken,
    ) -> OrchestratorResult<RunSummary> {
        let fingerprint = self.config.fingerprint();
        let target_count = self.config.generation.target_count;
        let (mut record, status) = self.progress_store.load(target_count, &fingerprint)?;

        if status == FingerprintStatus::Mismatch {
            let suffix = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
            match resume_choice {
                ResumeChoice::Auto | ResumeChoice::Interactive => {
                    self.progress_store.backup(&suffix)?;
                    record = CheckpointRecord::empty(target_count, fingerprint);
                }
            }
        }

        let remaining = target_count.saturating_sub(record.completed.len());
        if remaining == 0 {
            return Ok(RunSummary {
                record,
                succeeded: 0,
                failed: 0,
            });
        }

        let workers = self.config.generation.workers.max(1);
        let batch_size = self.config.generation.batch_size.max(1);
        let rate_limit_delay = Duration::from_millis(self.config.generation.rate_limit_delay_ms);
        let params = CompletionParams {
            temperature: self.config.generation.temperature,
            max_output_tokens: self.config.generation.max_tokens,
            timeout: Duration::from_secs(self.config.generation.timeout_secs),
        };
        let mode = self.config.generation.simulator_mode();
        let retry_attempts = self.config.generation.retry_attempts;

        let (seed_tx, seed_rx) = mpsc::channel::<usize>(workers * 2);
        let seed_rx = Arc::new(TokioMutex::new(seed_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<Option<GeneratedConversation>>(batch_size * 2);

        let producer_cancel = cancel.clone();
        let seed_count = self.seeds.count();
        let producer = tokio::spawn(async move {
            loop {
                let idx = rand::thread_rng().gen_range(0..seed_count);
                tokio::select! {
                    _ = producer_cancel.cancelled() => break,
                    send_result = seed_tx.send(idx) => {
                        if send_result.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut worker_handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let seed_rx = Arc::clone(&seed_rx);
            let result_tx = result_tx.clone();
            let seeds = Arc::clone(&self.seeds);
            let completer = Arc::clone(&self.completer);
            let call_log = self.call_log.clone();
            let worker_cancel = cancel.clone();

            let handle = tokio::spawn(async move {
                loop {
                    if worker_cancel.is_cancelled() {
                        break;
                    }
                    let idx = {
                        let mut rx = seed_rx.lock().await;
                        tokio::select! {
                            _ = worker_cancel.cancelled() => None,
                            maybe_idx = rx.recv() => maybe_idx,
                        }
                    };
                    let Some(idx) = idx else { break };
                    let Some(seed) = seeds.get(idx) else { continue };

                    tokio::time::sleep(rate_limit_delay).await;

                    let outcome = generate_conversation(
                        idx,
                        seed,
                        mode,
                        completer.as_ref(),
                        call_log.as_deref(),
                        params,
                        retry_attempts,
                        &worker_cancel,
                    )
                    .await;

                    if result_tx.send(outcome.conversation).await.is_err() {
                        break;
                    }
                }
            });
            worker_handles.push(handle);
        }
        drop(result_tx);

        let mut batch = Vec::with_capacity(batch_size);
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        while record.completed.len() < target_count {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = result_rx.recv() => {
                    match maybe {
                        Some(Some(conversation)) => {
                            succeeded += 1;
                            batch.push(conversation);
                            if batch.len() >= batch_size {
                                self.progress_store.append_batch(&mut record, std::mem::take(&mut batch))?;
                                tokio::time::sleep(rate_limit_delay * 2).await;
                            }
                        }
                        Some(None) => {
                            failed += 1;
                        }
                        None => break,
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.progress_store.append_batch(&mut record, batch)?;
        }

        cancel.cancel();
        producer.abort();
        for handle in worker_handles {
            let _ = handle.await;
        }

        Ok(RunSummary {
            record,
            succeeded,
            failed,
        })
    }

    /// Non-interactive entrypoint: resume silently on fingerprint match,
    /// back up and restart silently on mismatch.
    pub async fn run_auto_resume(&self, cancel: CancellationToken) -> OrchestratorResult<RunSummary> {
        self.run(ResumeChoice::Auto, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, Seed, Turn};
    use crate::provider::{ChatMessage, CompletionResult, ProviderError};
    use async_trait::async_trait;
    use tempfile::tempdir;

    fn seed_store() -> Arc<SeedStore> {
        let json = r#"[
            {
                "system": "You are an airline agent.",
                "tools": "[{\"name\":\"book_reservation\",\"description\":\"book\",\"parameters\":{\"properties\":{},\"required\":[]}}]",
                "conversations": [
                    {"from": "human", "value": "Book me a flight."},
                    {"from": "gpt", "value": "Sure."}
                ]
            }
        ]"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("seeds.json");
        std::fs::write(&path, json).unwrap();
        let store = SeedStore::load(&path).unwrap();
        std::mem::forget(dir);
        Arc::new(store)
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl ChatCompleter for AlwaysSucceeds {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: CompletionParams,
            _cancel: &CancellationToken,
        ) -> Result<CompletionResult, ProviderError> {
            Ok(CompletionResult {
                text: "HUMAN: Book me a flight.\nASSISTANT: Sure, booking now.".to_string(),
                tokens_used: Some(10),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    fn test_config(target_count: usize, sample_path: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.generation.target_count = target_count;
        config.generation.workers = 2;
        config.generation.batch_size = 2;
        config.generation.rate_limit_delay_ms = 0;
        config.generation.sample_data_path = sample_path.to_string_lossy().to_string();
        config
    }

    #[tokio::test]
    async fn reaches_target_count_and_commits_checkpoint() {
        let seeds = seed_store();
        let dir = tempdir().unwrap();
        let checkpoint_path = dir.path().join("checkpoint.json");
        let config = test_config(5, dir.path());

        let orchestrator = Orchestrator::new(
            Arc::clone(&seeds),
            Arc::new(AlwaysSucceeds),
            None,
            ProgressStore::new(&checkpoint_path),
            config,
        );

        let summary = orchestrator
            .run_auto_resume(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.record.completed.len(), 5);
        assert!(checkpoint_path.exists());
    }

    #[tokio::test]
    async fn resume_continues_from_existing_checkpoint() {
        let seeds = seed_store();
        let dir = tempdir().unwrap();
        let checkpoint_path = dir.path().join("checkpoint.json");
        let config = test_config(4, dir.path());
        let fingerprint = config.fingerprint();

        let store = ProgressStore::new(&checkpoint_path);
        let (mut record, _) = store.load(4, &fingerprint).unwrap();
        let seed = seeds.get(0).unwrap();
        let pre_existing = GeneratedConversation {
            conversations: vec![Turn::new(Role::Human, "hi")],
            tools: seed.tools.clone(),
            system: seed.system.clone(),
            based_on_sample: "preexisting".to_string(),
            sample_turns: 1,
            generated_turns: 1,
            domain: "airline".to_string(),
            simulator_mode: SimulatorMode::Base,
        };
        store.append_batch(&mut record, vec![pre_existing]).unwrap();

        let orchestrator = Orchestrator::new(
            Arc::clone(&seeds),
            Arc::new(AlwaysSucceeds),
            None,
            ProgressStore::new(&checkpoint_path),
            config,
        );
        let summary = orchestrator
            .run_auto_resume(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.record.completed.len(), 4);
        assert!(summary
            .record
            .completed
            .iter()
            .any(|c| c.based_on_sample == "preexisting"));
    }

    #[tokio::test]
    async fn fingerprint_mismatch_backs_up_and_restarts() {
        let seeds = seed_store();
        let dir = tempdir().unwrap();
        let checkpoint_path = dir.path().join("checkpoint.json");
        let config = test_config(2, dir.path());

        let store = ProgressStore::new(&checkpoint_path);
        let (mut record, _) = store.load(2, "stale-fingerprint").unwrap();
        store.append_batch(&mut record, vec![]).unwrap();

        let orchestrator = Orchestrator::new(
            seeds,
            Arc::new(AlwaysSucceeds),
            None,
            ProgressStore::new(&checkpoint_path),
            config,
        );
        let summary = orchestrator
            .run_auto_resume(CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.record.completed.len(), 2);
    }
}
