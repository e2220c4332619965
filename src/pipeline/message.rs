//! Structured progress and error messages emitted by filters and the
//! pipeline.
//!
//! Messages go to an optional observer channel; a pipeline without an
//! observer only logs.

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Error,
    Warning,
    Status,
    Progress,
}

/// One notification about a filter (or the pipeline as a whole, in which
/// case `class_name` is empty and `pipeline_index` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineMessage {
    pub kind: MessageKind,
    pub class_name: String,
    pub human_label: String,
    pub pipeline_index: Option<usize>,
    /// Parameter the message is about, when it concerns one.
    pub property: Option<String>,
    /// Error or warning code; 0 for status and progress.
    pub code: i32,
    pub text: String,
    /// Percent complete, 0..=100.
    pub progress: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

impl PipelineMessage {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            class_name: String::new(),
            human_label: String::new(),
            pipeline_index: None,
            property: None,
            code: 0,
            text: text.into(),
            progress: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the emitting filter's identity.
    pub fn from_filter(mut self, class_name: &str, human_label: &str, index: Option<usize>) -> Self {
        self.class_name = class_name.to_string();
        self.human_label = human_label.to_string();
        self.pipeline_index = index;
        self
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress = Some(percent.min(100));
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

impl fmt::Display for PipelineMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.pipeline_index {
            write!(f, "[{}] ", index)?;
        }
        if !self.human_label.is_empty() {
            write!(f, "{}", self.human_label)?;
            if let Some(property) = &self.property {
                write!(f, " [{}]", property)?;
            }
            write!(f, ": ")?;
        }
        match self.kind {
            MessageKind::Error | MessageKind::Warning => {
                write!(f, "{} ({})", self.text, self.code)
            }
            MessageKind::Progress => match self.progress {
                Some(p) => write!(f, "{} {}%", self.text, p),
                None => write!(f, "{}", self.text),
            },
            MessageKind::Status => write!(f, "{}", self.text),
        }
    }
}

/// Create an observer channel pair.
pub fn channel() -> (Sender<PipelineMessage>, Receiver<PipelineMessage>) {
    unbounded()
}

/// Send to the observer if one is attached; a dropped receiver is ignored.
pub(crate) fn notify(observer: Option<&Sender<PipelineMessage>>, message: PipelineMessage) {
    match message.kind {
        MessageKind::Error => tracing::error!("{}", message),
        MessageKind::Warning => tracing::warn!("{}", message),
        MessageKind::Status | MessageKind::Progress => tracing::debug!("{}", message),
    }
    if let Some(tx) = observer {
        let _ = tx.send(message);
    }
}

/// Drain all pending messages from an observer.
pub fn drain(rx: &Receiver<PipelineMessage>) -> Vec<PipelineMessage> {
    rx.try_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_identity() {
        let msg = PipelineMessage::new(MessageKind::Error, "Path not found")
            .from_filter("ThresholdArray", "Threshold Array", Some(3))
            .with_code(-106);
        assert_eq!(msg.to_string(), "[3] Threshold Array: Path not found (-106)");
        assert!(msg.is_error());
    }

    #[test]
    fn test_progress_clamped() {
        let msg = PipelineMessage::new(MessageKind::Progress, "Thresholding").with_progress(150);
        assert_eq!(msg.progress, Some(100));
        assert_eq!(msg.to_string(), "Thresholding 100%");
    }

    #[test]
    fn test_notify_ignores_dropped_receiver() {
        let (tx, rx) = channel();
        notify(Some(&tx), PipelineMessage::new(MessageKind::Status, "one"));
        assert_eq!(drain(&rx).len(), 1);
        drop(rx);
        notify(Some(&tx), PipelineMessage::new(MessageKind::Status, "two"));
        notify(None, PipelineMessage::new(MessageKind::Status, "three"));
    }
}
