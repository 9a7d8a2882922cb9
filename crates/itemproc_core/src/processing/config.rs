//! Tunables for the batch processing pipeline.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroConcurrency,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroConcurrency => write!(f, "max_concurrency must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

/// Batch pipeline settings.
///
/// # Invariants
/// - `max_concurrency >= 1`; a zero-permit pool would never drain its queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    max_concurrency: usize,
    simulated_latency: Duration,
}

impl ProcessingConfig {
    /// Builds a validated config.
    ///
    /// # Errors
    /// - `ConfigError::ZeroConcurrency` when `max_concurrency == 0`.
    pub fn new(max_concurrency: usize, simulated_latency: Duration) -> Result<Self, ConfigError> {
        if max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(Self {
            max_concurrency,
            simulated_latency,
        })
    }

    /// Number of workers allowed in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Delay every worker suspends for before touching the store.
    pub fn simulated_latency(&self) -> Duration {
        self.simulated_latency
    }

    pub fn with_simulated_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = latency;
        self
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            simulated_latency: DEFAULT_SIMULATED_LATENCY,
        }
    }
}
