//! Direct and list-driven sync orchestration.

use serde::Serialize;

use crate::checkpoint::Checkpoint;
use crate::endpoint::SyncMode;
use crate::error::SyncError;
use crate::paginate::{DrainStats, Paginator};
use crate::target::SyncTarget;
use crate::traits::{CheckpointStore, PageFetcher, RecordSink};

/// Summary of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub endpoint: String,
    /// Keys read from the key source.
    pub keys_seen: u64,
    /// Keys skipped because the checkpoint was not yet passed.
    pub keys_skipped: u64,
    /// Keys whose sub-resource was drained.
    pub keys_processed: u64,
    /// Keys whose sub-resource came back 404.
    pub keys_not_found: u64,
    pub pages: u64,
    pub records: u64,
}

impl SyncReport {
    fn new(target: &SyncTarget) -> Self {
        Self {
            endpoint: target.endpoint.name.to_string(),
            ..Self::default()
        }
    }

    fn add(&mut self, stats: DrainStats) {
        self.pages += stats.pages;
        self.records += stats.records;
    }
}

/// Runs an endpoint to completion through a [`Paginator`].
pub struct SyncService<F: PageFetcher> {
    paginator: Paginator<F>,
}

impl<F: PageFetcher> SyncService<F> {
    pub fn new(paginator: Paginator<F>) -> Self {
        Self { paginator }
    }

    /// Drain a top-level collection once. No checkpoint is kept; rerunning
    /// starts again from the first page.
    pub async fn run_direct<S: RecordSink>(
        &self,
        mut target: SyncTarget,
        sink: &mut S,
    ) -> Result<SyncReport, SyncError> {
        expect_mode(&target, SyncMode::Direct)?;
        let mut report = SyncReport::new(&target);

        tracing::info!(endpoint = target.endpoint.name, "Starting direct sync");
        let stats = self.paginator.drain(&mut target, sink).await?;
        sink.flush()?;
        report.add(stats);

        Ok(report)
    }

    /// Drain the sub-resource of every key after the checkpoint, in key order.
    ///
    /// Each key starts from a fresh cursor. A 404 skips the key; any other
    /// error aborts the run with the checkpoint still on the previous key.
    /// After each key the sink is flushed and the key is persisted, so a
    /// restart resumes with the next key.
    pub async fn run_list<K, C, S>(
        &self,
        target: &SyncTarget,
        keys: K,
        checkpoint: &mut Checkpoint<C>,
        sink: &mut S,
    ) -> Result<SyncReport, SyncError>
    where
        K: IntoIterator<Item = Result<String, SyncError>>,
        C: CheckpointStore,
        S: RecordSink,
    {
        expect_mode(target, SyncMode::ListDriven)?;
        let mut report = SyncReport::new(target);

        tracing::info!(endpoint = target.endpoint.name, "Starting list-driven sync");
        for key in keys {
            let key = key?;
            report.keys_seen += 1;

            if !checkpoint.reached(&key)? {
                report.keys_skipped += 1;
                tracing::debug!(%key, "Already processed, skipping");
                continue;
            }

            let mut keyed = target.for_key(&key);
            tracing::info!(%key, "Syncing key");
            match self.paginator.drain(&mut keyed, sink).await {
                Ok(stats) => {
                    report.keys_processed += 1;
                    report.add(stats);
                }
                Err(e) if e.is_recoverable_per_key() => {
                    report.keys_not_found += 1;
                    tracing::warn!(%key, error = %e, "Sub-resource missing, skipping key");
                }
                Err(e) => return Err(e),
            }

            sink.flush()?;
            checkpoint.persist(&key)?;
        }

        if let Some(pending) = checkpoint.pending_key() {
            tracing::warn!(
                checkpoint = %pending,
                "Checkpointed key never appeared in the key source; nothing was synced"
            );
        }

        Ok(report)
    }
}

fn expect_mode(target: &SyncTarget, mode: SyncMode) -> Result<(), SyncError> {
    if target.endpoint.mode != mode {
        return Err(SyncError::ConfigError(format!(
            "endpoint '{}' is {} and cannot run as {mode}",
            target.endpoint.name, target.endpoint.mode
        )));
    }
    Ok(())
}
