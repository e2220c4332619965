//! Structured (container, matrix, array) paths and rename events.
//!
//! A [`DataArrayPath`] addresses a data container, an attribute matrix
//! inside it, or an array inside that matrix. Trailing components may be
//! empty: `Image||` names a container, `Image|Cells|` a matrix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator used by the text form of a path.
pub const PATH_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataArrayPath {
    pub data_container: String,
    pub attribute_matrix: String,
    pub data_array: String,
}

impl DataArrayPath {
    pub fn new(
        data_container: impl Into<String>,
        attribute_matrix: impl Into<String>,
        data_array: impl Into<String>,
    ) -> Self {
        Self {
            data_container: data_container.into(),
            attribute_matrix: attribute_matrix.into(),
            data_array: data_array.into(),
        }
    }

    /// Path naming only a data container.
    pub fn container(data_container: impl Into<String>) -> Self {
        Self::new(data_container, "", "")
    }

    /// Path naming an attribute matrix.
    pub fn matrix(data_container: impl Into<String>, attribute_matrix: impl Into<String>) -> Self {
        Self::new(data_container, attribute_matrix, "")
    }

    pub fn is_empty(&self) -> bool {
        self.data_container.is_empty()
            && self.attribute_matrix.is_empty()
            && self.data_array.is_empty()
    }

    /// True when all three components are set.
    pub fn is_array_path(&self) -> bool {
        !self.data_container.is_empty()
            && !self.attribute_matrix.is_empty()
            && !self.data_array.is_empty()
    }

    /// The matrix part of this path (array component cleared).
    pub fn matrix_path(&self) -> DataArrayPath {
        Self::matrix(self.data_container.clone(), self.attribute_matrix.clone())
    }

    /// A sibling array path in the same matrix.
    pub fn with_array(&self, data_array: impl Into<String>) -> DataArrayPath {
        Self::new(
            self.data_container.clone(),
            self.attribute_matrix.clone(),
            data_array,
        )
    }

    /// Whether `self` and `other` point into the same attribute matrix.
    pub fn same_matrix(&self, other: &DataArrayPath) -> bool {
        self.data_container == other.data_container
            && self.attribute_matrix == other.attribute_matrix
    }
}

impl fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.data_container,
            self.attribute_matrix,
            self.data_array,
            sep = PATH_SEPARATOR
        )
    }
}

impl FromStr for DataArrayPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(PATH_SEPARATOR).collect();
        match parts.as_slice() {
            [dc] => Ok(Self::container(*dc)),
            [dc, am] => Ok(Self::matrix(*dc, *am)),
            [dc, am, da] => Ok(Self::new(*dc, *am, *da)),
            _ => Err(format!("Invalid data array path '{}'", s)),
        }
    }
}

/// A container, matrix or array was renamed from `old` to `new`.
///
/// The depth of the rename is given by how many components of `old` are
/// set; both paths must have the same depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRename {
    pub old: DataArrayPath,
    pub new: DataArrayPath,
}

impl PathRename {
    pub fn new(old: DataArrayPath, new: DataArrayPath) -> Self {
        Self { old, new }
    }

    /// Apply this rename to `path`, returning the updated path when it is
    /// affected.
    pub fn apply(&self, path: &DataArrayPath) -> Option<DataArrayPath> {
        if path.data_container != self.old.data_container {
            return None;
        }
        let mut renamed = path.clone();
        if self.old.attribute_matrix.is_empty() {
            renamed.data_container = self.new.data_container.clone();
            return Some(renamed);
        }
        if path.attribute_matrix != self.old.attribute_matrix {
            return None;
        }
        if self.old.data_array.is_empty() {
            renamed.attribute_matrix = self.new.attribute_matrix.clone();
            return Some(renamed);
        }
        if path.data_array != self.old.data_array {
            return None;
        }
        renamed.data_array = self.new.data_array.clone();
        Some(renamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: DataArrayPath = "Image|Cells|Phases".parse().unwrap();
        assert_eq!(path, DataArrayPath::new("Image", "Cells", "Phases"));
        assert_eq!(path.to_string(), "Image|Cells|Phases");

        let dc: DataArrayPath = "Image".parse().unwrap();
        assert_eq!(dc, DataArrayPath::container("Image"));
        assert!("a|b|c|d".parse::<DataArrayPath>().is_err());
    }

    #[test]
    fn test_matrix_helpers() {
        let path = DataArrayPath::new("Image", "Cells", "Phases");
        assert!(path.is_array_path());
        assert_eq!(path.matrix_path(), DataArrayPath::matrix("Image", "Cells"));
        assert!(path.same_matrix(&path.with_array("Mask")));
        assert!(!path.matrix_path().is_array_path());
    }

    #[test]
    fn test_rename_container_level() {
        let rename = PathRename::new(
            DataArrayPath::container("Image"),
            DataArrayPath::container("Volume"),
        );
        let path = DataArrayPath::new("Image", "Cells", "Phases");
        assert_eq!(
            rename.apply(&path),
            Some(DataArrayPath::new("Volume", "Cells", "Phases"))
        );
        assert_eq!(rename.apply(&DataArrayPath::container("Other")), None);
    }

    #[test]
    fn test_rename_array_level() {
        let rename = PathRename::new(
            DataArrayPath::new("Image", "Cells", "Phases"),
            DataArrayPath::new("Image", "Cells", "PhaseIds"),
        );
        let sibling = DataArrayPath::new("Image", "Cells", "Mask");
        assert_eq!(rename.apply(&sibling), None);
        assert_eq!(
            rename.apply(&DataArrayPath::new("Image", "Cells", "Phases")),
            Some(DataArrayPath::new("Image", "Cells", "PhaseIds"))
        );
    }

    #[test]
    fn test_rename_matrix_level_keeps_array() {
        let rename = PathRename::new(
            DataArrayPath::matrix("Image", "Cells"),
            DataArrayPath::matrix("Image", "Voxels"),
        );
        assert_eq!(
            rename.apply(&DataArrayPath::new("Image", "Cells", "Phases")),
            Some(DataArrayPath::new("Image", "Voxels", "Phases"))
        );
    }
}
