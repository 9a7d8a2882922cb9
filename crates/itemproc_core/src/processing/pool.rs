//! Bounded execution slots shared by batch invocations.
//!
//! # Invariants
//! - At most `capacity` permits are outstanding at any time.
//! - Waiters queue on the semaphore; acquisition never rejects.

use crate::processing::config::ProcessingConfig;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity worker pool.
///
/// Cheap to clone; clones share the same permits, so two concurrent batches
/// served by one pool together never exceed `capacity` workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool with `capacity` slots. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(config.max_concurrency())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot. The slot is released when the permit drops.
    ///
    /// # Errors
    /// - Fails only if the pool was closed.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.permits).acquire_owned().await
    }

    /// Stops handing out permits; pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_waits_when_all_slots_are_taken() {
        let pool = WorkerPool::new(2);
        let first = pool.acquire().await.unwrap();
        let _second = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
        assert!(blocked.is_err(), "third acquire should queue");

        drop(first);
        let third = tokio::time::timeout(Duration::from_millis(200), pool.acquire()).await;
        assert!(third.unwrap().is_ok());
    }

    #[tokio::test]
    async fn closed_pool_rejects_acquire() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert!(pool.acquire().await.is_err());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
    }
}
