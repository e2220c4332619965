//! Independent task sets.

use crate::parallel::pool::ParallelContext;

type Task<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Runs a set of heterogeneous closures and waits for all of them.
///
/// Tasks may borrow from the caller's stack; `wait` joins before returning.
pub struct ParallelTaskAlgorithm<'a> {
    tasks: Vec<Task<'a>>,
    context: ParallelContext,
}

impl<'a> Default for ParallelTaskAlgorithm<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ParallelTaskAlgorithm<'a> {
    pub fn new() -> Self {
        Self::with_context(ParallelContext::default())
    }

    pub fn with_context(context: ParallelContext) -> Self {
        Self {
            tasks: Vec::new(),
            context,
        }
    }

    pub fn set_parallelization_enabled(&mut self, enabled: bool) {
        self.context.set_enabled(enabled);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn execute<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'a,
    {
        self.tasks.push(Box::new(task));
    }

    /// Run every queued task and block until all have finished.
    pub fn wait(&mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        if tasks.is_empty() {
            return;
        }
        if !self.context.is_enabled() {
            tasks.into_iter().for_each(|task| task());
            return;
        }
        tracing::trace!("Running {} tasks", tasks.len());
        self.context.install(|| {
            rayon::scope(|s| {
                for task in tasks {
                    s.spawn(move |_| task());
                }
            })
        });
    }
}
