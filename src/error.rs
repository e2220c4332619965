//! Error handling for voxelpipe
//!
//! This module defines the top-level error type and a Result alias. The data
//! model and the pipeline keep their own error enums; both convert into
//! [`VoxelPipeError`].

use crate::data::DataError;
use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for voxelpipe operations
#[derive(Error, Debug)]
pub enum VoxelPipeError {
    /// Errors from arrays, matrices and container lookups
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Errors from building or running a pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<VoxelPipeError>,
    },
}

impl VoxelPipeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        VoxelPipeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for VoxelPipeError {
    fn from(err: serde_json::Error) -> Self {
        VoxelPipeError::Serialization(err.to_string())
    }
}

/// Result type alias for voxelpipe operations
pub type Result<T> = std::result::Result<T, VoxelPipeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<VoxelPipeError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
