//! Renames an attribute array in place.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::{DataArrayPath, DataContainerArray, DataError};
use crate::pipeline::parameter::{
    expect_path, expect_string, ParameterDef, ParameterKind, ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "RenameAttributeArray";
const LABEL: &str = "Rename Attribute Array";
const UUID: &str = "53a5f731-2858-4e3e-bd78-cb5d9c0e4a6b";

static PARAMETERS: &[ParameterDef<RenameAttributeArray>] = &[
    ParameterDef {
        name: "selected_array",
        label: "Attribute Array to Rename",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.selected_array.clone()),
        set: |f, v| {
            f.selected_array = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "new_array_name",
        label: "New Attribute Array Name",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.new_array_name.clone()),
        set: |f, v| {
            f.new_array_name = expect_string(v)?;
            Ok(())
        },
    },
];

/// Downstream filters see the new name through the rename broadcast.
pub struct RenameAttributeArray {
    status: FilterStatus,
    pub selected_array: DataArrayPath,
    pub new_array_name: String,
}

impl RenameAttributeArray {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            selected_array: DataArrayPath::default(),
            new_array_name: String::new(),
        }
    }
}

impl Default for RenameAttributeArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for RenameAttributeArray {
    filter_common!("Core");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if self.new_array_name.is_empty() {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "new_array_name",
                "New array name must be set",
            );
            return;
        }
        if !dca.does_attribute_array_exist(&self.selected_array) {
            let err = DataError::PathNotFound(self.selected_array.clone());
            self.status.set_data_error(&err);
            return;
        }
        let target = self.selected_array.with_array(self.new_array_name.as_str());
        if target != self.selected_array && dca.does_attribute_array_exist(&target) {
            let err = DataError::NameCollision(target.to_string());
            self.status.set_data_error(&err);
            return;
        }

        if let Some(rename) = dca.rename_attribute_array(&self.selected_array, &self.new_array_name) {
            if rename.old != rename.new {
                self.status.record_rename(rename);
            }
        }
    }

    fn execute(&mut self, _dca: &mut DataContainerArray) {}
}
