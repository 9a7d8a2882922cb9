//! Item use-case service.
//!
//! # Responsibility
//! - Provide CRUD entry points over `ItemRepository`.
//! - Expose the bulk `process_all` operation backed by `ItemProcessor`.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - The worker pool is injected, never created implicitly per call.

use crate::model::item::{Item, ItemId};
use crate::processing::config::ProcessingConfig;
use crate::processing::orchestrator::{BatchReport, ItemProcessor};
use crate::processing::pool::WorkerPool;
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Use-case facade for item CRUD and batch processing.
pub struct ItemService<R> {
    repo: Arc<R>,
    processor: ItemProcessor<R>,
}

impl<R> ItemService<R>
where
    R: ItemRepository + 'static,
{
    /// Creates a service sharing `pool` with any other holder of the same pool.
    pub fn new(repo: R, pool: WorkerPool, config: ProcessingConfig) -> Self {
        let repo = Arc::new(repo);
        let processor = ItemProcessor::new(Arc::clone(&repo), pool, config);
        Self { repo, processor }
    }

    /// Creates a service with its own pool sized from `config`.
    pub fn with_config(repo: R, config: ProcessingConfig) -> Self {
        let pool = WorkerPool::from_config(&config);
        Self::new(repo, pool, config)
    }

    /// Direct repository access for callers composing their own queries.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn find_all(&self) -> RepoResult<Vec<Item>> {
        self.repo.list_items()
    }

    pub fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        self.repo.get_item(id)
    }

    /// Creates an item and returns its stored state.
    ///
    /// # Errors
    /// - `RepoError::Validation` for rule violations.
    /// - `RepoError::EmailConflict` when the email belongs to another item.
    pub fn create(&self, item: &Item) -> RepoResult<Item> {
        info!("event=item_create module=service status=start item_id={}", item.id);
        let id = self.repo.create_item(item).inspect_err(|err| {
            warn!("event=item_create module=service status=error item_id={} error={err}", item.id)
        })?;
        self.repo
            .get_item(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("created item {id} missing on read-back")))
    }

    /// Replaces the item stored under `id` with `item`'s fields.
    ///
    /// The path `id` wins over `item.id`.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when `id` is not stored.
    pub fn update(&self, id: ItemId, item: &Item) -> RepoResult<Item> {
        let mut replacement = item.clone();
        replacement.id = id;

        info!("event=item_update module=service status=start item_id={id}");
        self.repo.update_item(&replacement).inspect_err(|err| {
            warn!("event=item_update module=service status=error item_id={id} error={err}")
        })?;
        self.repo
            .get_item(id)?
            .ok_or(RepoError::NotFound(id))
    }

    /// Inserts or updates by `item.id`.
    pub fn save(&self, item: &Item) -> RepoResult<Item> {
        self.repo.save_item(item)
    }

    pub fn delete_by_id(&self, id: ItemId) -> RepoResult<()> {
        info!("event=item_delete module=service status=start item_id={id}");
        self.repo.delete_item(id)
    }

    /// Processes every stored item; see `ItemProcessor::process_all`.
    pub async fn process_all(&self) -> RepoResult<Vec<Item>> {
        self.processor.process_all().await
    }

    /// See `ItemProcessor::process_all_with_report`.
    pub async fn process_all_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> RepoResult<BatchReport> {
        self.processor.process_all_with_report(cancel).await
    }
}
