//! Built-in filters.
//!
//! | Class                            | Group      |
//! |----------------------------------|------------|
//! | `CreateImageGeometry`            | Core       |
//! | `CreateAttributeMatrix`          | Core       |
//! | `CreateDataArray`                | Core       |
//! | `RenameAttributeArray`           | Core       |
//! | `DeleteData`                     | Core       |
//! | `ThresholdArray`                 | Processing |
//! | `CopyFeatureArrayToElementArray` | Processing |
//! | `RemoveFlaggedFeatures`          | Processing |

pub mod copy_feature_array;
pub mod create_array;
pub mod create_attribute_matrix;
pub mod create_image_geometry;
pub mod delete_data;
pub mod remove_flagged_features;
pub mod rename_array;
pub mod threshold;

pub use copy_feature_array::CopyFeatureArrayToElementArray;
pub use create_array::CreateDataArray;
pub use create_attribute_matrix::CreateAttributeMatrix;
pub use create_image_geometry::CreateImageGeometry;
pub use delete_data::DeleteData;
pub use remove_flagged_features::RemoveFlaggedFeatures;
pub use rename_array::RenameAttributeArray;
pub use threshold::ThresholdArray;

use crate::pipeline::FilterRegistry;

/// Error code for parameter values a filter cannot work with.
pub const INVALID_PARAMETER: i32 = -11000;

/// Register every built-in filter with `registry`.
pub fn register_builtin(registry: &mut FilterRegistry) {
    registry.register(|| Box::new(CreateImageGeometry::new()));
    registry.register(|| Box::new(CreateAttributeMatrix::new()));
    registry.register(|| Box::new(CreateDataArray::new()));
    registry.register(|| Box::new(RenameAttributeArray::new()));
    registry.register(|| Box::new(DeleteData::new()));
    registry.register(|| Box::new(ThresholdArray::new()));
    registry.register(|| Box::new(CopyFeatureArrayToElementArray::new()));
    registry.register(|| Box::new(RemoveFlaggedFeatures::new()));
}

/// Identity, status and parameter-table methods of a [`Filter`] impl.
///
/// Expects `NAME`, `LABEL`, `UUID` and `PARAMETERS` in the calling module and
/// a `status: FilterStatus` field.
///
/// [`Filter`]: crate::pipeline::Filter
macro_rules! filter_common {
    ($group:expr) => {
        fn name(&self) -> &'static str {
            NAME
        }

        fn human_label(&self) -> &'static str {
            LABEL
        }

        fn uuid(&self) -> &'static str {
            UUID
        }

        fn group(&self) -> &'static str {
            $group
        }

        fn status(&self) -> &$crate::pipeline::FilterStatus {
            &self.status
        }

        fn status_mut(&mut self) -> &mut $crate::pipeline::FilterStatus {
            &mut self.status
        }

        fn parameters(&self) -> Vec<$crate::pipeline::ParameterInfo> {
            $crate::pipeline::parameter::infos(PARAMETERS)
        }

        fn parameter(&self, name: &str) -> Option<$crate::pipeline::ParameterValue> {
            $crate::pipeline::parameter::get(PARAMETERS, self, name)
        }

        fn set_parameter(
            &mut self,
            name: &str,
            value: &$crate::pipeline::ParameterValue,
        ) -> $crate::pipeline::PipelineResult<()> {
            $crate::pipeline::parameter::set(PARAMETERS, self, NAME, name, value)
        }
    };
}
pub(crate) use filter_common;
