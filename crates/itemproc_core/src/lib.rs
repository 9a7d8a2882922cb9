//! Item record store and bulk asynchronous processing pipeline.
//!
//! `ItemService` is the entry point: CRUD over `ItemRepository` plus
//! `process_all`, which marks every stored item `PROCESSED` on a bounded
//! worker pool and returns the items that made it.

pub mod db;
pub mod logging;
pub mod model;
pub mod processing;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, ItemStatus, ItemValidationError};
pub use processing::{
    BatchReport, BatchStats, ConfigError, ItemProcessor, ItemWorker, ProcessingConfig,
    ResultStore, WorkerOutcome, WorkerPool,
};
pub use repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
pub use service::item_service::ItemService;
pub use tokio_util::sync::CancellationToken;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
