//! Pipeline-specific error types.

use thiserror::Error;

/// Errors that can occur while building, preflighting or executing a
/// pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A filter set a negative error code. `property` names the parameter
    /// at fault, if the filter reported one.
    #[error(
        "{label} ({filter}, index {index}){} failed with code {code}: {message}",
        .property.as_ref().map(|p| format!(" parameter '{}'", p)).unwrap_or_default()
    )]
    Fatal {
        filter: String,
        label: String,
        index: usize,
        property: Option<String>,
        code: i32,
        message: String,
    },

    /// Several filters failed during a preflight that did not stop at the
    /// first error.
    #[error("Preflight failed for {} filters; first: {}", .0.len(), .0.first().map(|e| e.to_string()).unwrap_or_default())]
    Multiple(Vec<PipelineError>),

    #[error("Pipeline cancelled before filter index {0}")]
    Cancelled(usize),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Parameter '{name}' of {filter}: {message}")]
    Parameter {
        filter: String,
        name: String,
        message: String,
    },

    #[error("Index {index} out of range for pipeline of {len} filters")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Negative error code for filter failures, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            PipelineError::Fatal { code, .. } => Some(*code),
            PipelineError::Multiple(errors) => errors.first().and_then(PipelineError::code),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn fatal(index: usize) -> PipelineError {
        PipelineError::Fatal {
            filter: "ThresholdArray".into(),
            label: "Threshold Array".into(),
            index,
            property: None,
            code: -106,
            message: "Path not found: Image|Cells|Missing".into(),
        }
    }

    #[test]
    fn test_fatal_display_names_property() {
        let err = PipelineError::Fatal {
            filter: "CreateDataArray".into(),
            label: "Create Data Array".into(),
            index: 0,
            property: Some("initial_value".into()),
            code: -11001,
            message: "'x' is not a valid u8 value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Create Data Array (CreateDataArray, index 0) parameter 'initial_value' \
             failed with code -11001: 'x' is not a valid u8 value"
        );
        assert!(!fatal(0).to_string().contains("parameter"));
    }

    #[test]
    fn test_fatal_display_names_filter() {
        let text = fatal(2).to_string();
        assert!(text.contains("Threshold Array"));
        assert!(text.contains("index 2"));
        assert!(text.contains("Image|Cells|Missing"));
    }

    #[test]
    fn test_multiple_reports_first() {
        let err = PipelineError::Multiple(vec![fatal(1), fatal(3)]);
        assert_eq!(err.code(), Some(-106));
        assert!(err.to_string().contains("2 filters"));
        assert!(err.to_string().contains("index 1"));
    }
}
