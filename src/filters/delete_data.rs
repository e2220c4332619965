//! Removes a data container, attribute matrix or attribute array.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::{DataArrayPath, DataContainerArray, DataError};
use crate::pipeline::parameter::{expect_path, ParameterDef, ParameterKind, ParameterValue};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "DeleteData";
const LABEL: &str = "Delete Data";
const UUID: &str = "7b1c8f59-d2a5-4a3f-8b0e-6e9f1d7c2a38";

static PARAMETERS: &[ParameterDef<DeleteData>] = &[ParameterDef {
    name: "selected_data",
    label: "Data to Delete",
    kind: ParameterKind::Path,
    get: |f| ParameterValue::Path(f.selected_data.clone()),
    set: |f, v| {
        f.selected_data = expect_path(v)?;
        Ok(())
    },
}];

pub struct DeleteData {
    status: FilterStatus,
    /// `Image||` removes the container, `Image|Cells|` the matrix and
    /// `Image|Cells|Mask` a single array.
    pub selected_data: DataArrayPath,
}

impl DeleteData {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            selected_data: DataArrayPath::default(),
        }
    }
}

impl Default for DeleteData {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for DeleteData {
    filter_common!("Core");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        let path = &self.selected_data;
        if path.data_container.is_empty()
            || (path.attribute_matrix.is_empty() && !path.data_array.is_empty())
        {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "selected_data",
                format!("'{}' does not name a container, matrix or array", path),
            );
            return;
        }

        let removed = if path.attribute_matrix.is_empty() {
            dca.remove_data_container(&path.data_container).is_some()
        } else if path.data_array.is_empty() {
            dca.data_container_mut(&path.data_container)
                .and_then(|dc| dc.remove_attribute_matrix(&path.attribute_matrix))
                .is_some()
        } else {
            dca.attribute_matrix_mut(path)
                .and_then(|am| am.remove_attribute_array(&path.data_array))
                .is_some()
        };
        if !removed {
            let err = DataError::PathNotFound(path.clone());
            self.status.set_data_error(&err);
        }
    }

    fn execute(&mut self, _dca: &mut DataContainerArray) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::image_with_features;

    fn delete(path: &str) -> DeleteData {
        let mut f = DeleteData::new();
        f.set_parameter("selected_data", &ParameterValue::String(path.into()))
            .unwrap();
        f
    }

    #[test]
    fn test_delete_each_depth() {
        let mut dca = image_with_features([2, 2, 1], vec![0, 1, 1, 2], 3);

        delete("Image|Cells|FeatureIds").run(&mut dca);
        assert!(dca.attribute_matrix(&DataArrayPath::matrix("Image", "Cells")).unwrap().is_empty());

        delete("Image|Features|").run(&mut dca);
        assert!(!dca.does_attribute_matrix_exist(&DataArrayPath::matrix("Image", "Features")));

        delete("Image").run(&mut dca);
        assert!(dca.is_empty());
    }

    #[test]
    fn test_missing_target() {
        let mut dca = image_with_features([2, 1, 1], vec![0, 1], 2);
        let mut f = delete("Image|Cells|Nope");
        f.preflight(&mut dca);
        assert_eq!(f.status().error_code(), -106);
    }

    #[test]
    fn test_array_without_matrix_rejected() {
        let mut f = DeleteData::new();
        f.selected_data = DataArrayPath::new("Image", "", "FeatureIds");
        f.preflight(&mut DataContainerArray::new());
        assert_eq!(f.status().error_code(), INVALID_PARAMETER);
    }
}
