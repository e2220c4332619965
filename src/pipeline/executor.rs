//! Pipeline driver: an ordered list of filters run against one
//! [`DataContainerArray`].
//!
//! The driver is sequential. Parallelism only happens inside a filter's
//! `execute`, through the context handed out by
//! [`FilterPipeline::set_parallel_context`].
//!
//! 1. `preflight_pipeline` runs every `data_check` on a fresh shape-only
//!    container array, broadcasting recorded renames downstream.
//! 2. `execute` polls the cancel flag before each filter, then runs it
//!    (`data_check` with allocation, then `execute`). A fatal error halts the
//!    run; nothing is rolled back.

use crate::config::{ParallelSettings, VoxelPipeConfig};
use crate::data::{DataContainerArray, PathRename};
use crate::parallel::ParallelContext;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::filter::{Filter, FilterState};
use crate::pipeline::message::{self, MessageKind, PipelineMessage};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Ordered filter list with preflight / execute / cancel.
pub struct FilterPipeline {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    cancel: Arc<AtomicBool>,
    stop_on_error: bool,
    errors: Vec<PipelineMessage>,
    observer: Option<Sender<PipelineMessage>>,
    parallel: ParallelContext,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            name: String::from("Untitled Pipeline"),
            filters: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            stop_on_error: true,
            errors: Vec::new(),
            observer: None,
            parallel: ParallelContext::default(),
        }
    }

    /// Pipeline using the parallel and stop-on-error settings of `config`.
    pub fn with_config(config: &VoxelPipeConfig) -> Self {
        let mut pipeline = Self::new();
        pipeline.stop_on_error = config.pipeline.stop_on_error;
        pipeline.set_parallel_settings(&config.parallel);
        pipeline
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ── Structure ──

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn push_back(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
        self.update_prev_next_filters();
    }

    pub fn push_front(&mut self, filter: Box<dyn Filter>) {
        self.filters.insert(0, filter);
        self.update_prev_next_filters();
    }

    /// Insert at `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, filter: Box<dyn Filter>) -> PipelineResult<()> {
        if index > self.filters.len() {
            return Err(PipelineError::IndexOutOfRange {
                index,
                len: self.filters.len(),
            });
        }
        self.filters.insert(index, filter);
        self.update_prev_next_filters();
        Ok(())
    }

    pub fn erase(&mut self, index: usize) -> Option<Box<dyn Filter>> {
        if index >= self.filters.len() {
            return None;
        }
        let mut removed = self.filters.remove(index);
        detach(removed.as_mut());
        self.update_prev_next_filters();
        Some(removed)
    }

    pub fn pop_front(&mut self) -> Option<Box<dyn Filter>> {
        self.erase(0)
    }

    pub fn pop_back(&mut self) -> Option<Box<dyn Filter>> {
        let mut removed = self.filters.pop()?;
        detach(removed.as_mut());
        Some(removed)
    }

    pub fn clear(&mut self) {
        for filter in &mut self.filters {
            detach(filter.as_mut());
        }
        self.filters.clear();
        self.errors.clear();
    }

    pub fn filter(&self, index: usize) -> Option<&dyn Filter> {
        self.filters.get(index).map(|f| f.as_ref())
    }

    pub fn filter_mut(&mut self, index: usize) -> Option<&mut (dyn Filter + 'static)> {
        self.filters.get_mut(index).map(|f| f.as_mut())
    }

    pub fn filters(&self) -> impl Iterator<Item = &dyn Filter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    /// Filter before `index`, if any.
    pub fn previous(&self, index: usize) -> Option<&dyn Filter> {
        index.checked_sub(1).and_then(|i| self.filter(i))
    }

    /// Filter after `index`, if any.
    pub fn next(&self, index: usize) -> Option<&dyn Filter> {
        self.filter(index + 1)
    }

    /// Re-stamp every filter with its position, the observer and the
    /// parallel context.
    pub fn update_prev_next_filters(&mut self) {
        for (index, filter) in self.filters.iter_mut().enumerate() {
            let status = filter.status_mut();
            status.set_pipeline_index(Some(index));
            status.set_observer(self.observer.clone());
            status.set_parallel(self.parallel.clone());
        }
    }

    // ── Settings ──

    pub fn stop_on_error(&self) -> bool {
        self.stop_on_error
    }

    pub fn set_stop_on_error(&mut self, stop: bool) {
        self.stop_on_error = stop;
    }

    pub fn set_observer(&mut self, observer: Option<Sender<PipelineMessage>>) {
        self.observer = observer;
        self.update_prev_next_filters();
    }

    pub fn parallel_context(&self) -> &ParallelContext {
        &self.parallel
    }

    pub fn set_parallel_context(&mut self, parallel: ParallelContext) {
        self.parallel = parallel;
        self.update_prev_next_filters();
    }

    pub fn set_parallel_settings(&mut self, settings: &ParallelSettings) {
        self.set_parallel_context(ParallelContext::from_settings(settings));
    }

    /// Error messages from the last preflight or execute.
    pub fn errors(&self) -> &[PipelineMessage] {
        &self.errors
    }

    // ── Cancellation ──

    /// Shared flag; setting it stops the run before the next filter.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    // ── Renames ──

    /// Apply `rename` to every filter's input path parameters. Returns how
    /// many filters changed.
    pub fn rename_path(&mut self, rename: &PathRename) -> usize {
        self.broadcast_rename(0, rename)
    }

    fn broadcast_rename(&mut self, from: usize, rename: &PathRename) -> usize {
        let mut changed = 0;
        for filter in self.filters.iter_mut().skip(from) {
            if filter.rename_paths(rename) {
                tracing::debug!(
                    "Updated paths of {} after rename {} -> {}",
                    filter.human_label(),
                    rename.old,
                    rename.new
                );
                changed += 1;
            }
        }
        changed
    }

    fn broadcast_recorded_renames(&mut self, index: usize) {
        let renames = self.filters[index].status().renamed_paths().to_vec();
        for rename in &renames {
            self.broadcast_rename(index + 1, rename);
        }
    }

    // ── Running ──

    /// Validate the whole pipeline on a fresh shape-only container array and
    /// return it.
    ///
    /// With stop-on-error (the default) the first fatal filter ends the pass;
    /// otherwise every filter is checked and all failures are reported.
    pub fn preflight_pipeline(&mut self) -> PipelineResult<DataContainerArray> {
        let start = Instant::now();
        self.errors.clear();
        self.update_prev_next_filters();
        tracing::info!(
            "Preflighting pipeline '{}' ({} filters)",
            self.name,
            self.filters.len()
        );

        let mut dca = DataContainerArray::new();
        let mut failures = Vec::new();
        for index in 0..self.filters.len() {
            self.filters[index].preflight(&mut dca);
            self.broadcast_recorded_renames(index);

            let filter = self.filters[index].as_ref();
            if filter.status().has_error() {
                self.errors.extend(error_messages(filter));
                failures.push(fatal(filter, index));
                if self.stop_on_error {
                    self.mark_not_run(index + 1);
                    break;
                }
            }
        }

        tracing::info!(
            "Preflight of '{}' finished in {:?} with {} errors",
            self.name,
            start.elapsed(),
            failures.len()
        );
        match failures.len() {
            0 => Ok(dca),
            1 => Err(failures.remove(0)),
            _ => Err(PipelineError::Multiple(failures)),
        }
    }

    /// Execute every filter on a fresh container array.
    pub fn execute(&mut self) -> PipelineResult<DataContainerArray> {
        let mut dca = DataContainerArray::new();
        self.execute_on(&mut dca)?;
        Ok(dca)
    }

    /// Execute every filter on `dca`. On failure `dca` keeps whatever the
    /// filters before the failing one produced.
    pub fn execute_on(&mut self, dca: &mut DataContainerArray) -> PipelineResult<()> {
        let start = Instant::now();
        let total = self.filters.len();
        self.errors.clear();
        self.update_prev_next_filters();
        tracing::info!("Executing pipeline '{}' ({} filters)", self.name, total);

        for index in 0..total {
            if self.is_cancelled() {
                tracing::warn!(
                    "Pipeline '{}' cancelled before filter {}",
                    self.name,
                    index
                );
                self.mark_not_run(index);
                self.notify(PipelineMessage::new(
                    MessageKind::Status,
                    format!("Pipeline cancelled before filter {}", index),
                ));
                return Err(PipelineError::Cancelled(index));
            }

            self.notify(
                PipelineMessage::new(
                    MessageKind::Progress,
                    format!("[{}/{}] {}", index + 1, total, self.filters[index].human_label()),
                )
                .with_progress((index * 100 / total.max(1)) as u8),
            );

            let filter_start = Instant::now();
            self.filters[index].run(dca);
            self.broadcast_recorded_renames(index);

            let filter = self.filters[index].as_ref();
            tracing::debug!(
                "Filter [{}] {} finished in {:?} ({:?})",
                index,
                filter.human_label(),
                filter_start.elapsed(),
                filter.status().state()
            );
            if filter.status().has_error() {
                self.errors.extend(error_messages(filter));
                let err = fatal(filter, index);
                self.mark_not_run(index + 1);
                return Err(err);
            }
        }

        self.notify(
            PipelineMessage::new(MessageKind::Progress, "Pipeline complete").with_progress(100),
        );
        tracing::info!(
            "Pipeline '{}' completed in {:?}",
            self.name,
            start.elapsed()
        );
        Ok(())
    }

    /// Preflight, then execute if the preflight was clean.
    pub fn run(&mut self) -> PipelineResult<DataContainerArray> {
        self.preflight_pipeline()?;
        self.execute()
    }

    fn mark_not_run(&mut self, from: usize) {
        for filter in self.filters.iter_mut().skip(from) {
            filter.status_mut().set_state(FilterState::NotRun);
        }
    }

    fn notify(&self, msg: PipelineMessage) {
        message::notify(self.observer.as_ref(), msg);
    }
}

fn detach(filter: &mut dyn Filter) {
    let status = filter.status_mut();
    status.set_pipeline_index(None);
    status.set_observer(None);
}

fn error_messages(filter: &dyn Filter) -> impl Iterator<Item = PipelineMessage> + '_ {
    filter
        .status()
        .messages()
        .iter()
        .filter(|m| m.kind == MessageKind::Error)
        .cloned()
}

fn fatal(filter: &dyn Filter, index: usize) -> PipelineError {
    PipelineError::Fatal {
        filter: filter.name().to_string(),
        label: filter.human_label().to_string(),
        index,
        property: filter.status().error_property().map(str::to_string),
        code: filter.status().error_code(),
        message: filter
            .status()
            .error_message()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
