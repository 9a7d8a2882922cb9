//! Bulk asynchronous item processing.
//!
//! # Responsibility
//! - Fan out one worker task per processable item onto a bounded pool.
//! - Join on every task before reading the per-invocation result store.
//!
//! # Invariants
//! - Worker failures never abort a batch; they only shrink the result.
//! - Each invocation owns a fresh `ResultStore`; nothing leaks across calls.
//! - The pool is built once by the caller and injected.

pub mod config;
pub mod orchestrator;
pub mod pool;
pub mod result_store;
pub mod worker;

pub use config::{ConfigError, ProcessingConfig};
pub use orchestrator::{BatchReport, BatchStats, ItemProcessor};
pub use pool::WorkerPool;
pub use result_store::ResultStore;
pub use worker::{ItemWorker, WorkerOutcome};
