//! Per-item batch worker.
//!
//! # Responsibility
//! - Suspend for the simulated downstream latency.
//! - Fetch, mark `PROCESSED`, persist, then record the stored item.
//!
//! # Invariants
//! - A worker never returns an error; every failure folds into a `WorkerOutcome`.
//! - Only `WorkerOutcome::Processed` writes to the result store.
//! - Cancellation is observed during the latency wait and never leaks to siblings.

use crate::model::item::{Item, ItemId};
use crate::processing::result_store::ResultStore;
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Terminal state of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerOutcome {
    /// Persisted as `PROCESSED` and recorded in the result store.
    Processed,
    /// The id no longer resolves to an item.
    NotFound,
    /// The store rejected the write on the email uniqueness constraint.
    Conflict,
    /// Stopped by its cancellation token before any side effect.
    Cancelled,
    /// Any other storage failure, or the task was lost.
    Failed,
}

impl WorkerOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl Display for WorkerOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch-mutate-persist task body shared by every worker of a batch.
pub struct ItemWorker<R> {
    repo: Arc<R>,
    latency: Duration,
}

impl<R> ItemWorker<R>
where
    R: ItemRepository + 'static,
{
    pub fn new(repo: Arc<R>, latency: Duration) -> Self {
        Self { repo, latency }
    }

    /// Processes one item and reports how it ended.
    ///
    /// # Side effects
    /// - Writes the item back to the repository with status `PROCESSED`.
    /// - Inserts the persisted item into `store` on success only.
    pub async fn run(
        &self,
        id: ItemId,
        store: &ResultStore,
        cancel: &CancellationToken,
    ) -> WorkerOutcome {
        let started_at = Instant::now();
        debug!("event=item_process module=worker status=start item_id={id}");

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(
                    "event=item_process module=worker status=skip item_id={id} outcome=cancelled duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return WorkerOutcome::Cancelled;
            }
            () = tokio::time::sleep(self.latency) => {}
        }

        let result = match self.transition(id).await {
            Ok(result) => result,
            Err(join_err) => {
                error!(
                    "event=item_process module=worker status=error item_id={id} outcome=failed error_code=blocking_task_lost error={join_err}"
                );
                return WorkerOutcome::Failed;
            }
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        match result {
            Ok(Some(saved)) => {
                store.insert(id, saved);
                info!(
                    "event=item_process module=worker status=ok item_id={id} outcome=processed duration_ms={elapsed_ms}"
                );
                WorkerOutcome::Processed
            }
            Ok(None) => {
                warn!(
                    "event=item_process module=worker status=skip item_id={id} outcome=not_found duration_ms={elapsed_ms}"
                );
                WorkerOutcome::NotFound
            }
            Err(RepoError::EmailConflict(_)) => {
                error!(
                    "event=item_process module=worker status=error item_id={id} outcome=conflict duration_ms={elapsed_ms} error_code=email_conflict"
                );
                WorkerOutcome::Conflict
            }
            Err(err) => {
                error!(
                    "event=item_process module=worker status=error item_id={id} outcome=failed duration_ms={elapsed_ms} error={err}"
                );
                WorkerOutcome::Failed
            }
        }
    }

    /// Runs the synchronous repository steps on the blocking pool.
    async fn transition(
        &self,
        id: ItemId,
    ) -> Result<RepoResult<Option<Item>>, tokio::task::JoinError> {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || -> RepoResult<Option<Item>> {
            let Some(mut item) = repo.get_item(id)? else {
                return Ok(None);
            };
            item.mark_processed();
            repo.save_item(&item).map(Some)
        })
        .await
    }
}
