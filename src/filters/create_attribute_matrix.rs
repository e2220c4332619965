//! Adds an empty attribute matrix to an existing data container.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::{AttributeMatrixType, DataArrayPath, DataContainerArray, DataError};
use crate::pipeline::parameter::{
    expect_path, expect_string, expect_usize_vec, usize_vec, ParameterDef, ParameterKind,
    ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "CreateAttributeMatrix";
const LABEL: &str = "Create Attribute Matrix";
const UUID: &str = "93375ef0-7367-4f0d-a4a6-4d0b2c1e8f07";

const MATRIX_TYPES: &[&str] = &["Element", "Feature", "Ensemble", "Generic"];

static PARAMETERS: &[ParameterDef<CreateAttributeMatrix>] = &[
    ParameterDef {
        name: "created_matrix",
        label: "Created Attribute Matrix",
        kind: ParameterKind::CreatedPath,
        get: |f| ParameterValue::Path(f.created_matrix.clone()),
        set: |f, v| {
            f.created_matrix = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "tuple_dimensions",
        label: "Tuple Dimensions",
        kind: ParameterKind::IntVec,
        get: |f| usize_vec(&f.tuple_dims),
        set: |f, v| {
            f.tuple_dims = expect_usize_vec(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "matrix_type",
        label: "Attribute Matrix Type",
        kind: ParameterKind::Choice(MATRIX_TYPES),
        get: |f| ParameterValue::String(f.matrix_type.display_name().to_string()),
        set: |f, v| {
            f.matrix_type = parse_matrix_type(&expect_string(v)?)?;
            Ok(())
        },
    },
];

fn parse_matrix_type(text: &str) -> Result<AttributeMatrixType, String> {
    match text {
        "Element" => Ok(AttributeMatrixType::Element),
        "Feature" => Ok(AttributeMatrixType::Feature),
        "Ensemble" => Ok(AttributeMatrixType::Ensemble),
        "Generic" => Ok(AttributeMatrixType::Generic),
        other => Err(format!("unknown matrix type '{}'", other)),
    }
}

pub struct CreateAttributeMatrix {
    status: FilterStatus,
    /// Container and matrix name; the array part is ignored.
    pub created_matrix: DataArrayPath,
    pub tuple_dims: Vec<usize>,
    pub matrix_type: AttributeMatrixType,
}

impl CreateAttributeMatrix {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            created_matrix: DataArrayPath::matrix("ImageDataContainer", "AttributeMatrix"),
            tuple_dims: vec![1],
            matrix_type: AttributeMatrixType::Generic,
        }
    }
}

impl Default for CreateAttributeMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for CreateAttributeMatrix {
    filter_common!("Core");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if self.tuple_dims.is_empty() || self.tuple_dims.contains(&0) {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "tuple_dimensions",
                format!("Tuple dimensions must be positive, got {:?}", self.tuple_dims),
            );
            return;
        }
        if self.created_matrix.attribute_matrix.is_empty() {
            self.status.set_parameter_error(
                INVALID_PARAMETER - 1,
                "created_matrix",
                "Attribute matrix name is empty",
            );
            return;
        }
        let path = &self.created_matrix;
        let Some(dc) = dca.data_container_mut(&path.data_container) else {
            let err = DataError::PathNotFound(DataArrayPath::container(path.data_container.clone()));
            self.status.set_data_error(&err);
            return;
        };
        self.status.check(dc.create_attribute_matrix(
            &self.tuple_dims,
            &path.attribute_matrix,
            self.matrix_type,
        ));
    }

    fn execute(&mut self, _dca: &mut DataContainerArray) {}
}
