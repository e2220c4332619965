//! Worker pool selection shared by the parallel algorithms.

use crate::config::ParallelSettings;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::Arc;

/// Runtime parallel configuration handed to filters.
///
/// Cloning is cheap; a dedicated pool (if any) is shared.
#[derive(Clone)]
pub struct ParallelContext {
    enabled: bool,
    grain: Option<usize>,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for ParallelContext {
    fn default() -> Self {
        Self {
            enabled: true,
            grain: None,
            pool: None,
        }
    }
}

impl fmt::Debug for ParallelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelContext")
            .field("enabled", &self.enabled)
            .field("grain", &self.grain)
            .field("threads", &self.current_num_threads())
            .finish()
    }
}

impl ParallelContext {
    /// Context that always runs sequentially.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Build a context from settings. A dedicated pool is created when a
    /// thread count is configured; if that fails execution falls back to
    /// the sequential path.
    pub fn from_settings(settings: &ParallelSettings) -> Self {
        let mut ctx = Self {
            enabled: settings.enabled,
            grain: settings.grain,
            pool: None,
        };
        if let (true, Some(threads)) = (settings.enabled, settings.num_threads) {
            ctx.set_max_threads(threads);
        }
        ctx
    }

    /// Route work to a dedicated pool of `threads` workers.
    pub fn set_max_threads(&mut self, threads: usize) {
        match ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("voxelpipe-worker-{}", i))
            .build()
        {
            Ok(pool) => {
                tracing::debug!("Created worker pool with {} threads", threads);
                self.pool = Some(Arc::new(pool));
            }
            Err(e) => {
                tracing::warn!("Failed to create worker pool, running sequentially: {}", e);
                self.pool = None;
                self.enabled = false;
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn grain(&self) -> Option<usize> {
        self.grain
    }

    /// Worker count of the pool work will run on.
    pub fn current_num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run `op` inside the dedicated pool, or the global pool if none.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}
