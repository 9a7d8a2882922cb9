//! Batch orchestrator: fan-out, completion barrier, aggregate.
//!
//! # Responsibility
//! - Enumerate processable ids and spawn one worker task per id.
//! - Gate every worker on the injected `WorkerPool`.
//! - Wait for all tasks, then return the invocation's `ResultStore` contents.
//!
//! # Invariants
//! - Nothing is returned before every spawned task has finished.
//! - A fresh `ResultStore` backs each invocation.
//! - No timeout is applied to the barrier; a stalled worker stalls the batch.

use crate::model::item::{Item, ItemId};
use crate::processing::config::ProcessingConfig;
use crate::processing::pool::WorkerPool;
use crate::processing::result_store::ResultStore;
use crate::processing::worker::{ItemWorker, WorkerOutcome};
use crate::repo::item_repo::{ItemRepository, RepoResult};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Per-outcome counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub requested: usize,
    pub processed: usize,
    pub not_found: usize,
    pub conflicts: usize,
    pub cancelled: usize,
    pub failed: usize,
}

impl BatchStats {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: WorkerOutcome) {
        match outcome {
            WorkerOutcome::Processed => self.processed += 1,
            WorkerOutcome::NotFound => self.not_found += 1,
            WorkerOutcome::Conflict => self.conflicts += 1,
            WorkerOutcome::Cancelled => self.cancelled += 1,
            WorkerOutcome::Failed => self.failed += 1,
        }
    }

    /// Workers that ended without a stored result.
    pub fn skipped(&self) -> usize {
        self.not_found + self.conflicts + self.cancelled + self.failed
    }

    /// Outcomes recorded so far; equals `requested` after the barrier.
    pub fn finished(&self) -> usize {
        self.processed + self.skipped()
    }
}

/// Items processed by one invocation plus its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Order is unspecified.
    pub items: Vec<Item>,
    pub stats: BatchStats,
}

/// Fans processable items out onto a bounded worker pool.
pub struct ItemProcessor<R> {
    repo: Arc<R>,
    pool: WorkerPool,
    config: ProcessingConfig,
}

impl<R> ItemProcessor<R>
where
    R: ItemRepository + 'static,
{
    pub fn new(repo: Arc<R>, pool: WorkerPool, config: ProcessingConfig) -> Self {
        Self { repo, pool, config }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Marks every processable item `PROCESSED` and returns those that succeeded.
    ///
    /// # Errors
    /// - Only when the processable id list cannot be read. Per-item failures
    ///   shorten the result instead.
    pub async fn process_all(&self) -> RepoResult<Vec<Item>> {
        let report = self
            .process_all_with_report(&CancellationToken::new())
            .await?;
        Ok(report.items)
    }

    /// Same as `process_all`, with outcome counters and batch-wide cancellation.
    ///
    /// Each worker gets a child of `cancel`; cancelling the parent stops queued
    /// and sleeping workers while the barrier still waits for all of them.
    pub async fn process_all_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> RepoResult<BatchReport> {
        let started_at = Instant::now();
        // Single short query; not worth a blocking-pool hop.
        let ids = self.repo.list_processable_ids()?;
        info!(
            "event=process_all module=orchestrator status=start requested={} capacity={}",
            ids.len(),
            self.pool.capacity()
        );

        let store = Arc::new(ResultStore::new());
        let worker = Arc::new(ItemWorker::new(
            Arc::clone(&self.repo),
            self.config.simulated_latency(),
        ));

        let mut tasks = JoinSet::new();
        for id in ids.iter().copied() {
            tasks.spawn(run_slot(
                id,
                self.pool.clone(),
                Arc::clone(&worker),
                Arc::clone(&store),
                cancel.child_token(),
            ));
        }

        let mut stats = BatchStats::new(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => stats.record(outcome),
                Err(join_err) => {
                    error!(
                        "event=process_all module=orchestrator status=error error_code=worker_task_lost error={join_err}"
                    );
                    stats.record(WorkerOutcome::Failed);
                }
            }
        }

        let items = match Arc::try_unwrap(store) {
            Ok(store) => store.into_items(),
            Err(shared) => shared.snapshot(),
        };

        let status = if stats.skipped() == 0 { "ok" } else { "partial" };
        info!(
            "event=process_all module=orchestrator status={status} requested={} processed={} not_found={} conflicts={} cancelled={} failed={} duration_ms={}",
            stats.requested,
            stats.processed,
            stats.not_found,
            stats.conflicts,
            stats.cancelled,
            stats.failed,
            started_at.elapsed().as_millis()
        );

        Ok(BatchReport { items, stats })
    }
}

/// Holds one pool slot for the whole worker run.
async fn run_slot<R>(
    id: ItemId,
    pool: WorkerPool,
    worker: Arc<ItemWorker<R>>,
    store: Arc<ResultStore>,
    cancel: CancellationToken,
) -> WorkerOutcome
where
    R: ItemRepository + 'static,
{
    let _permit = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            warn!("event=item_process module=orchestrator status=skip item_id={id} outcome=cancelled stage=queued");
            return WorkerOutcome::Cancelled;
        }
        permit = pool.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => {
                error!("event=item_process module=orchestrator status=error item_id={id} outcome=failed error_code=pool_closed");
                return WorkerOutcome::Failed;
            }
        },
    };

    worker.run(id, &store, &cancel).await
}
