//! Sizing of the worker pool used by the binning passes
//!
//! NaN replacement, pixel location and the per-pixel average/normalise steps
//! run on Rayon's global pool. `--threads` pins its size; without it Rayon
//! picks one worker per core.

use crate::errors::{GridBinError, Result};
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

/// Requested worker count for the global pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Workers the pool runs with once configured
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }

    /// Rejects an explicit request for zero workers.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::ThreadPoolError`] for `Some(0)`.
    pub fn validate(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(GridBinError::ThreadPoolError(
                "thread count must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Build the global pool. Only the first call in a process can size it.
    ///
    /// # Errors
    ///
    /// Returns [`GridBinError::ThreadPoolError`] for an invalid count or if
    /// the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<()> {
        self.validate()?;

        let Some(num_threads) = self.num_threads else {
            debug!(threads = self.effective_threads(), "using the default binning pool");
            return Ok(());
        };

        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("gridbin-{i}"))
            .build_global()
            .map_err(|e| {
                GridBinError::ThreadPoolError(format!(
                    "Failed to initialize thread pool with {} threads: {}",
                    num_threads, e
                ))
            })?;

        info!("✅ Binning with {} threads", num_threads);
        Ok(())
    }
}

/// Snapshot of the pool actually in use
#[derive(Debug, Clone, Copy)]
pub struct ParallelInfo {
    pub pool_threads: usize,
    pub available_cores: usize,
}

impl ParallelInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            pool_threads: rayon::current_num_threads(),
            available_cores: num_cpus::get(),
        }
    }

    pub fn log_info(&self) {
        info!(
            pool_threads = self.pool_threads,
            available_cores = self.available_cores,
            "📊 Parallel binning"
        );
    }
}
