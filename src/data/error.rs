//! Data-model error types.

use crate::data::array::ElementType;
use crate::data::path::DataArrayPath;
use thiserror::Error;

/// Errors raised by arrays, attribute matrices and container lookups.
///
/// Filters translate these into a negative error code on their status via
/// [`DataError::code`], so every variant has a stable code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Allocation failed for '{name}': {message}")]
    Allocation { name: String, message: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Name '{0}' already exists")]
    NameCollision(String),

    #[error("Index {index} out of range (size {size})")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    #[error("Path not found: {0}")]
    PathNotFound(DataArrayPath),

    #[error("Array '{path}' has {found} components, {expected} required")]
    ComponentMismatch {
        path: DataArrayPath,
        expected: usize,
        found: usize,
    },
}

impl DataError {
    /// Negative filter error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            DataError::Allocation { .. } => -101,
            DataError::ShapeMismatch(_) => -102,
            DataError::NameCollision(_) => -103,
            DataError::IndexOutOfRange { .. } => -104,
            DataError::TypeMismatch { .. } => -105,
            DataError::PathNotFound(_) => -106,
            DataError::ComponentMismatch { .. } => -107,
        }
    }
}

pub type DataResult<T> = std::result::Result<T, DataError>;
