//! Hand-written filters for driving the pipeline in tests

use super::CallLog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use voxelpipe::data::{DataArrayPath, DataContainerArray, DataError};
use voxelpipe::pipeline::parameter::{self, expect_path};
use voxelpipe::pipeline::{
    Filter, FilterStatus, ParameterDef, ParameterInfo, ParameterKind, ParameterValue,
    PipelineResult,
};

static PARAMETERS: &[ParameterDef<RecordingFilter>] = &[ParameterDef {
    name: "input",
    label: "Input Path",
    kind: ParameterKind::Path,
    get: |f| ParameterValue::Path(f.input.clone()),
    set: |f, v| {
        f.input = expect_path(v)?;
        Ok(())
    },
}];

/// Appends `check:<label>` / `exec:<label>` to a shared log and can be told
/// to fail or to raise the pipeline's cancel flag.
pub struct RecordingFilter {
    status: FilterStatus,
    label: &'static str,
    log: CallLog,
    /// Required to exist when non-empty.
    pub input: DataArrayPath,
    fail_check: Option<i32>,
    fail_execute: Option<i32>,
    warn_code: Option<i32>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RecordingFilter {
    pub fn new(label: &'static str, log: &CallLog) -> Self {
        Self {
            status: FilterStatus::new(),
            label,
            log: log.clone(),
            input: DataArrayPath::default(),
            fail_check: None,
            fail_execute: None,
            warn_code: None,
            cancel: None,
        }
    }

    pub fn failing_check(mut self, code: i32) -> Self {
        self.fail_check = Some(code);
        self
    }

    pub fn failing_execute(mut self, code: i32) -> Self {
        self.fail_execute = Some(code);
        self
    }

    pub fn warning(mut self, code: i32) -> Self {
        self.warn_code = Some(code);
        self
    }

    /// Raise `flag` at the end of `execute`.
    pub fn cancelling(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_input(mut self, path: DataArrayPath) -> Self {
        self.input = path;
        self
    }

    pub fn boxed(self) -> Box<dyn Filter> {
        Box::new(self)
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", event, self.label));
    }
}

impl Filter for RecordingFilter {
    fn name(&self) -> &'static str {
        "RecordingFilter"
    }

    fn human_label(&self) -> &'static str {
        self.label
    }

    fn uuid(&self) -> &'static str {
        "00000000-0000-0000-0000-000000000000"
    }

    fn status(&self) -> &FilterStatus {
        &self.status
    }

    fn status_mut(&mut self) -> &mut FilterStatus {
        &mut self.status
    }

    fn parameters(&self) -> Vec<ParameterInfo> {
        parameter::infos(PARAMETERS)
    }

    fn parameter(&self, name: &str) -> Option<ParameterValue> {
        parameter::get(PARAMETERS, self, name)
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> PipelineResult<()> {
        parameter::set(PARAMETERS, self, "RecordingFilter", name, value)
    }

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        self.record("check");
        if let Some(code) = self.warn_code {
            self.status.set_warning(code, format!("{} warns", self.label));
        }
        if let Some(code) = self.fail_check {
            self.status
                .set_error(code, format!("{} rejected its inputs", self.label));
            return;
        }
        if !self.input.is_empty() && !dca.does_attribute_array_exist(&self.input) {
            let err = DataError::PathNotFound(self.input.clone());
            self.status.set_data_error(&err);
        }
    }

    fn execute(&mut self, _dca: &mut DataContainerArray) {
        self.record("exec");
        if let Some(code) = self.fail_execute {
            self.status
                .set_error(code, format!("{} failed to execute", self.label));
        }
        if let Some(flag) = &self.cancel {
            flag.store(true, Ordering::SeqCst);
        }
    }
}
