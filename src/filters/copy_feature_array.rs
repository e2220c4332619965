//! Broadcasts a per-feature array onto the elements through their feature
//! ids.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::array::with_element_type;
use crate::data::{
    AnyArray, DataArray, DataArrayPath, DataContainerArray, DataError, DataResult,
};
use crate::parallel::{ParallelData3DAlgorithm, ParallelDataAlgorithm, Range3D};
use crate::pipeline::parameter::{
    expect_path, expect_string, ParameterDef, ParameterKind, ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "CopyFeatureArrayToElementArray";
const LABEL: &str = "Create Element Array from Feature Array";
const UUID: &str = "99836b75-144b-4fa0-b37b-6c0d7a5e1f02";

static PARAMETERS: &[ParameterDef<CopyFeatureArrayToElementArray>] = &[
    ParameterDef {
        name: "feature_ids",
        label: "Feature Ids",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.feature_ids.clone()),
        set: |f, v| {
            f.feature_ids = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "selected_feature_array",
        label: "Feature Data to Copy to Element Data",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.selected_feature_array.clone()),
        set: |f, v| {
            f.selected_feature_array = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "created_array_name",
        label: "Copied Attribute Array",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.created_array_name.clone()),
        set: |f, v| {
            f.created_array_name = expect_string(v)?;
            Ok(())
        },
    },
];

pub struct CopyFeatureArrayToElementArray {
    status: FilterStatus,
    pub feature_ids: DataArrayPath,
    pub selected_feature_array: DataArrayPath,
    /// Created in the matrix holding `feature_ids`.
    pub created_array_name: String,
}

/// Element `index` carries a feature id outside `0..features`.
struct BadFeatureId {
    index: usize,
    id: i32,
}

impl CopyFeatureArrayToElementArray {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            feature_ids: DataArrayPath::default(),
            selected_feature_array: DataArrayPath::default(),
            created_array_name: String::new(),
        }
    }

    fn created_path(&self) -> DataArrayPath {
        self.feature_ids.with_array(self.created_array_name.as_str())
    }

    /// Grid the element arrays live on: the container's image geometry when
    /// it matches the element count, otherwise a single row.
    fn grid_dims(dca: &DataContainerArray, path: &DataArrayPath, elements: usize) -> [usize; 3] {
        dca.data_container(&path.data_container)
            .and_then(|dc| dc.image_geometry())
            .filter(|geom| geom.number_of_elements() == elements)
            .map(|geom| geom.dimensions)
            .unwrap_or([elements, 1, 1])
    }

    fn copy(
        &self,
        dca: &DataContainerArray,
        output: &mut AnyArray,
    ) -> DataResult<Result<(), BadFeatureId>> {
        let ids = dca.get_prereq_array::<i32>(&self.feature_ids, 1)?.as_slice();
        let source = dca
            .attribute_array(&self.selected_feature_array)
            .ok_or_else(|| DataError::PathNotFound(self.selected_feature_array.clone()))?;
        let features = source.number_of_tuples();
        let ctx = self.status.parallel().clone();

        let validate = ParallelDataAlgorithm::with_context(0..ids.len(), ctx.clone());
        let checked = validate.try_execute(|range| {
            for index in range {
                let id = ids[index];
                if id < 0 || id as usize >= features {
                    return Err(BadFeatureId { index, id });
                }
            }
            Ok(())
        });
        if let Err(bad) = checked {
            return Ok(Err(bad));
        }

        let dims = Self::grid_dims(dca, &self.feature_ids, ids.len());
        let components = source.number_of_components();
        let algorithm = ParallelData3DAlgorithm::with_context(Range3D::from_dims(dims), ctx);
        with_element_type!(source.element_type(), T => {
            let src = source
                .downcast_ref::<T>()
                .map(DataArray::as_slice)
                .ok_or_else(|| DataError::PathNotFound(self.selected_feature_array.clone()))?;
            let found = output.element_type();
            let dst = output.downcast_mut::<T>().ok_or(DataError::TypeMismatch {
                expected: source.element_type(),
                found,
            })?;
            algorithm.execute_blocks(dst.as_mut_slice(), dims, components, |writer| {
                let block = writer.block().clone();
                for (x, y, z) in block.iter() {
                    let feature = ids[writer.index(x, y, z)] as usize;
                    let start = feature * components;
                    writer
                        .tuple_mut(x, y, z)
                        .clone_from_slice(&src[start..start + components]);
                }
            })?;
        });
        Ok(Ok(()))
    }
}

impl Default for CopyFeatureArrayToElementArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for CopyFeatureArrayToElementArray {
    filter_common!("Processing");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if self.created_array_name.is_empty() {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "created_array_name",
                "Created array name must be set",
            );
            return;
        }
        if self
            .status
            .check(dca.get_prereq_array::<i32>(&self.feature_ids, 1).map(|_| ()))
            .is_none()
        {
            return;
        }
        let Some(view) = self.status.check(dca.shape_view(&self.selected_feature_array)) else {
            return;
        };
        let (element_type, component_dims) = (view.element_type(), view.component_dims().to_vec());

        let allocate = self.status.allocate();
        let path = self.created_path();
        let created = with_element_type!(element_type, T => {
            dca.create_non_prereq_array::<T>(&path, &component_dims, allocate)
                .map(|_| ())
        });
        self.status.check(created);
    }

    fn execute(&mut self, dca: &mut DataContainerArray) {
        let path = self.created_path();
        let Some(mut output) = dca
            .attribute_matrix_mut(&path)
            .and_then(|am| am.remove_attribute_array(&path.data_array))
        else {
            self.status.set_data_error(&DataError::PathNotFound(path));
            return;
        };

        let result = self.copy(dca, &mut output);
        let restored = match dca.attribute_matrix_mut(&path) {
            Some(am) => am.add_attribute_array(output),
            None => Err(DataError::PathNotFound(path.matrix_path())),
        };
        match result {
            Ok(Ok(())) => {
                self.status.check(restored);
            }
            Ok(Err(BadFeatureId { index, id })) => {
                let features = dca
                    .attribute_array(&self.selected_feature_array)
                    .map_or(0, AnyArray::number_of_tuples);
                self.status.set_parameter_error(
                    INVALID_PARAMETER - 1,
                    "feature_ids",
                    format!(
                        "Element {} has feature id {}, outside the {} features of '{}'",
                        index, id, features, self.selected_feature_array
                    ),
                );
            }
            Err(err) => self.status.set_data_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_util::image_with_features;
    use crate::parallel::ParallelContext;
    use crate::pipeline::FilterState;

    fn with_feature_data(ids: Vec<i32>, dims: [usize; 3]) -> DataContainerArray {
        let mut dca = image_with_features(dims, ids, 3);
        dca.attribute_matrix_mut(&DataArrayPath::matrix("Image", "Features"))
            .unwrap()
            .add_attribute_array(
                DataArray::from_tuples("Color", &[2], vec![0u8, 0, 10, 11, 20, 21]).unwrap(),
            )
            .unwrap();
        dca
    }

    fn copy_filter() -> CopyFeatureArrayToElementArray {
        let mut f = CopyFeatureArrayToElementArray::new();
        f.feature_ids = DataArrayPath::new("Image", "Cells", "FeatureIds");
        f.selected_feature_array = DataArrayPath::new("Image", "Features", "Color");
        f.created_array_name = "CellColor".to_string();
        f
    }

    #[test]
    fn test_copies_feature_tuples() {
        let mut dca = with_feature_data(vec![1, 2, 2, 0], [2, 2, 1]);
        let mut f = copy_filter();
        f.run(&mut dca);
        assert_eq!(f.status().state(), FilterState::Completed);

        let out = dca
            .get_prereq_array::<u8>(&DataArrayPath::new("Image", "Cells", "CellColor"), 2)
            .unwrap();
        assert_eq!(out.as_slice(), &[10, 11, 20, 21, 20, 21, 0, 0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dims = [16, 8, 4];
        let ids: Vec<i32> = (0..16 * 8 * 4).map(|i| (i % 3) as i32).collect();

        let mut results = Vec::new();
        for ctx in [ParallelContext::default(), ParallelContext::sequential()] {
            let mut dca = with_feature_data(ids.clone(), dims);
            let mut f = copy_filter();
            f.status_mut().set_parallel(ctx);
            f.run(&mut dca);
            assert_eq!(f.status().state(), FilterState::Completed);
            results.push(
                dca.get_prereq_array::<u8>(&DataArrayPath::new("Image", "Cells", "CellColor"), 2)
                    .unwrap()
                    .as_slice()
                    .to_vec(),
            );
        }
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_out_of_range_id_faults() {
        let mut dca = with_feature_data(vec![0, 1, 7, 2], [2, 2, 1]);
        let mut f = copy_filter();
        f.run(&mut dca);
        assert_eq!(f.status().state(), FilterState::Faulted);
        assert_eq!(f.status().error_code(), INVALID_PARAMETER - 1);
        // The output array is still in place after the failure.
        assert!(dca.does_attribute_array_exist(&f.created_path()));
    }

    #[test]
    fn test_preflight_creates_matching_shape() {
        let mut dca = with_feature_data(vec![0, 1, 2, 2], [2, 2, 1]);
        let mut f = copy_filter();
        f.preflight(&mut dca);
        let view = dca.shape_view(&f.created_path()).unwrap();
        assert_eq!(view.number_of_tuples(), 4);
        assert_eq!(view.number_of_components(), 2);
    }
}
