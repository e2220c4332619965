//! The filter abstraction.
//!
//! A filter has two required operations:
//! - **`data_check`** validates inputs and creates outputs by shape only. It
//!   never reads or writes array contents.
//! - **`execute`** does the computation on arrays `data_check` prepared.
//!
//! The provided [`Filter::preflight`] and [`Filter::run`] wrap them in the
//! lifecycle:
//!
//! ```text
//! Idle ─► Preflighting ─► Preflighted ─► Executing ─► Completed
//!              │                             │
//!              └──────────► Faulted ◄────────┘      (error code < 0)
//! ```
//!
//! Filters skipped by cancellation or an earlier failure end in `NotRun`.

use crate::data::{DataArrayPath, DataContainerArray, DataError, DataResult, PathRename};
use crate::parallel::ParallelContext;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::message::{self, MessageKind, PipelineMessage};
use crate::pipeline::parameter::{ParameterInfo, ParameterKind, ParameterValue};
use crossbeam_channel::Sender;
use serde::Serialize;

/// Lifecycle state of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FilterState {
    #[default]
    Idle,
    Preflighting,
    Preflighted,
    Executing,
    Completed,
    Faulted,
    NotRun,
}

/// Per-filter bookkeeping shared by every filter implementation.
#[derive(Debug, Clone, Default)]
pub struct FilterStatus {
    class_name: &'static str,
    human_label: &'static str,
    state: FilterState,
    error_code: i32,
    warning_code: i32,
    messages: Vec<PipelineMessage>,
    pipeline_index: Option<usize>,
    allocate: bool,
    renamed_paths: Vec<PathRename>,
    parallel: ParallelContext,
    observer: Option<Sender<PipelineMessage>>,
}

impl FilterStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn set_state(&mut self, state: FilterState) {
        self.state = state;
    }

    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    pub fn warning_code(&self) -> i32 {
        self.warning_code
    }

    pub fn has_error(&self) -> bool {
        self.error_code < 0
    }

    /// Error and warning messages recorded since the last reset.
    pub fn messages(&self) -> &[PipelineMessage] {
        &self.messages
    }

    fn last_error(&self) -> Option<&PipelineMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Error)
    }

    /// Text of the most recent error.
    pub fn error_message(&self) -> Option<&str> {
        self.last_error().map(|m| m.text.as_str())
    }

    /// Parameter named by the most recent error, if any.
    pub fn error_property(&self) -> Option<&str> {
        self.last_error().and_then(|m| m.property.as_deref())
    }

    pub fn pipeline_index(&self) -> Option<usize> {
        self.pipeline_index
    }

    pub fn set_pipeline_index(&mut self, index: Option<usize>) {
        self.pipeline_index = index;
    }

    /// Whether `data_check` should allocate the arrays it creates.
    /// False during preflight.
    pub fn allocate(&self) -> bool {
        self.allocate
    }

    pub fn set_allocate(&mut self, allocate: bool) {
        self.allocate = allocate;
    }

    /// Renames performed by the last `data_check`.
    pub fn renamed_paths(&self) -> &[PathRename] {
        &self.renamed_paths
    }

    pub fn parallel(&self) -> &ParallelContext {
        &self.parallel
    }

    pub fn set_parallel(&mut self, parallel: ParallelContext) {
        self.parallel = parallel;
    }

    pub fn set_observer(&mut self, observer: Option<Sender<PipelineMessage>>) {
        self.observer = observer;
    }

    pub(crate) fn set_identity(&mut self, class_name: &'static str, human_label: &'static str) {
        self.class_name = class_name;
        self.human_label = human_label;
    }

    /// Clear codes, messages and recorded renames before a new pass.
    pub fn reset(&mut self) {
        self.error_code = 0;
        self.warning_code = 0;
        self.messages.clear();
        self.renamed_paths.clear();
    }

    fn message(&self, kind: MessageKind, text: String) -> PipelineMessage {
        PipelineMessage::new(kind, text).from_filter(
            self.class_name,
            self.human_label,
            self.pipeline_index,
        )
    }

    /// Record an error. Negative codes are fatal.
    pub fn set_error(&mut self, code: i32, text: impl Into<String>) {
        let msg = self.message(MessageKind::Error, text.into());
        self.push_error(code, msg);
    }

    /// Record an error caused by the value of parameter `property`.
    pub fn set_parameter_error(&mut self, code: i32, property: &str, text: impl Into<String>) {
        let msg = self
            .message(MessageKind::Error, text.into())
            .with_property(property);
        self.push_error(code, msg);
    }

    fn push_error(&mut self, code: i32, msg: PipelineMessage) {
        self.error_code = code;
        let msg = msg.with_code(code);
        self.messages.push(msg.clone());
        message::notify(self.observer.as_ref(), msg);
    }

    pub fn set_warning(&mut self, code: i32, text: impl Into<String>) {
        self.warning_code = code;
        let msg = self.message(MessageKind::Warning, text.into()).with_code(code);
        self.messages.push(msg.clone());
        message::notify(self.observer.as_ref(), msg);
    }

    /// Record a data-model error as a fatal filter error.
    pub fn set_data_error(&mut self, err: &DataError) {
        self.set_error(err.code(), err.to_string());
    }

    /// Unwrap `result`, recording the error and returning `None` on failure.
    pub fn check<T>(&mut self, result: DataResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.set_data_error(&err);
                None
            }
        }
    }

    /// Remember a rename so the pipeline can broadcast it downstream.
    pub fn record_rename(&mut self, rename: PathRename) {
        self.renamed_paths.push(rename);
    }

    pub fn notify_status(&self, text: impl Into<String>) {
        message::notify(
            self.observer.as_ref(),
            self.message(MessageKind::Status, text.into()),
        );
    }

    pub fn notify_progress(&self, text: impl Into<String>, percent: u8) {
        message::notify(
            self.observer.as_ref(),
            self.message(MessageKind::Progress, text.into())
                .with_progress(percent),
        );
    }
}

/// A pipeline stage operating on a [`DataContainerArray`].
pub trait Filter: Send {
    /// Class name used by the registry and pipeline files.
    fn name(&self) -> &'static str;

    fn human_label(&self) -> &'static str;

    fn uuid(&self) -> &'static str;

    fn group(&self) -> &'static str {
        "Core"
    }

    fn status(&self) -> &FilterStatus;

    fn status_mut(&mut self) -> &mut FilterStatus;

    fn parameters(&self) -> Vec<ParameterInfo>;

    fn parameter(&self, name: &str) -> Option<ParameterValue>;

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> PipelineResult<()>;

    /// Validate inputs and create outputs. Arrays are allocated only when
    /// `status().allocate()` is set.
    fn data_check(&mut self, dca: &mut DataContainerArray);

    /// Compute. Only called after a clean `data_check` on the same `dca`.
    fn execute(&mut self, dca: &mut DataContainerArray);

    /// Shape-only validation pass.
    fn preflight(&mut self, dca: &mut DataContainerArray) {
        let (name, label) = (self.name(), self.human_label());
        let status = self.status_mut();
        status.set_identity(name, label);
        status.reset();
        status.set_allocate(false);
        status.set_state(FilterState::Preflighting);

        self.data_check(dca);

        let status = self.status_mut();
        let state = if status.has_error() {
            FilterState::Faulted
        } else {
            FilterState::Preflighted
        };
        status.set_state(state);
    }

    /// `data_check` with allocation, then `execute` if it was clean.
    fn run(&mut self, dca: &mut DataContainerArray) {
        let (name, label) = (self.name(), self.human_label());
        let status = self.status_mut();
        status.set_identity(name, label);
        status.reset();
        status.set_allocate(true);
        status.set_state(FilterState::Executing);

        self.data_check(dca);
        if self.status().has_error() {
            self.status_mut().set_state(FilterState::Faulted);
            return;
        }

        self.execute(dca);

        let status = self.status_mut();
        let state = if status.has_error() {
            FilterState::Faulted
        } else {
            FilterState::Completed
        };
        status.set_state(state);
    }

    /// Update every input path parameter affected by `rename`. Created paths
    /// are left alone. Returns whether anything changed.
    fn rename_paths(&mut self, rename: &PathRename) -> bool {
        let mut changed = false;
        for info in self.parameters() {
            if info.kind != ParameterKind::Path {
                continue;
            }
            let current = self.parameter(info.name).and_then(|v| v.as_path());
            let Some(updated) = current.as_ref().and_then(|p| rename.apply(p)) else {
                continue;
            };
            if Some(&updated) == current.as_ref() {
                continue;
            }
            if self
                .set_parameter(info.name, &ParameterValue::Path(updated))
                .is_ok()
            {
                changed = true;
            }
        }
        changed
    }

    /// Path-valued parameters, input and created, in declaration order.
    fn path_parameters(&self) -> Vec<DataArrayPath> {
        self.parameters()
            .iter()
            .filter(|info| info.kind.is_path())
            .filter_map(|info| self.parameter(info.name).and_then(|v| v.as_path()))
            .collect()
    }
}
