//! Creates a data container holding a regular voxel grid and its element
//! matrix.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::{AttributeMatrixType, DataContainerArray, Geometry, ImageGeom};
use crate::pipeline::parameter::{
    expect_string, expect_usize_vec, usize_vec, ParameterDef, ParameterKind,
    ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "CreateImageGeometry";
const LABEL: &str = "Create Image Geometry";
const UUID: &str = "3c4e5a1e-6f28-4b8e-9d1b-0a7c2f5e8d41";

static PARAMETERS: &[ParameterDef<CreateImageGeometry>] = &[
    ParameterDef {
        name: "data_container",
        label: "Data Container",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.data_container.clone()),
        set: |f, v| {
            f.data_container = expect_string(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "cell_matrix",
        label: "Cell Attribute Matrix",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.cell_matrix.clone()),
        set: |f, v| {
            f.cell_matrix = expect_string(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "dimensions",
        label: "Dimensions",
        kind: ParameterKind::IntVec,
        get: |f| usize_vec(&f.dimensions),
        set: |f, v| {
            f.dimensions = to_array(&expect_usize_vec(v)?)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "spacing",
        label: "Spacing",
        kind: ParameterKind::FloatVec,
        get: |f| ParameterValue::FloatVec(f.spacing.iter().map(|&s| s as f64).collect()),
        set: |f, v| {
            f.spacing = to_f32_array(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "origin",
        label: "Origin",
        kind: ParameterKind::FloatVec,
        get: |f| ParameterValue::FloatVec(f.origin.iter().map(|&s| s as f64).collect()),
        set: |f, v| {
            f.origin = to_f32_array(v)?;
            Ok(())
        },
    },
];

fn to_array(values: &[usize]) -> Result<[usize; 3], String> {
    <[usize; 3]>::try_from(values).map_err(|_| format!("expected 3 values, got {}", values.len()))
}

fn to_f32_array(value: &ParameterValue) -> Result<[f32; 3], String> {
    if let Some(single) = value.as_float() {
        return Ok([single as f32; 3]);
    }
    let values = value
        .as_float_vec()
        .ok_or_else(|| format!("expected a number list, got {}", value))?;
    match values.as_slice() {
        &[x, y, z] => Ok([x as f32, y as f32, z as f32]),
        _ => Err(format!("expected 3 values, got {}", values.len())),
    }
}

pub struct CreateImageGeometry {
    status: FilterStatus,
    pub data_container: String,
    pub cell_matrix: String,
    pub dimensions: [usize; 3],
    pub spacing: [f32; 3],
    pub origin: [f32; 3],
}

impl CreateImageGeometry {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            data_container: "ImageDataContainer".to_string(),
            cell_matrix: "CellData".to_string(),
            dimensions: [1, 1, 1],
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }
}

impl Default for CreateImageGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for CreateImageGeometry {
    filter_common!("Core");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if self.dimensions.contains(&0) {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "dimensions",
                format!("Dimensions must be positive, got {:?}", self.dimensions),
            );
            return;
        }
        if self.spacing.iter().any(|&s| s <= 0.0) {
            self.status.set_parameter_error(
                INVALID_PARAMETER - 1,
                "spacing",
                format!("Spacing must be positive, got {:?}", self.spacing),
            );
            return;
        }
        if self.cell_matrix.is_empty() {
            self.status.set_parameter_error(
                INVALID_PARAMETER - 2,
                "cell_matrix",
                "Cell attribute matrix name is empty",
            );
            return;
        }

        let geometry = ImageGeom::new(self.dimensions)
            .with_spacing(self.spacing)
            .with_origin(self.origin);
        let Some(dc) = self.status.check(dca.create_data_container(&self.data_container)) else {
            return;
        };
        let tuple_dims = geometry.tuple_dims();
        dc.set_geometry(Geometry::Image(geometry));
        self.status.check(dc.create_attribute_matrix(
            &tuple_dims,
            &self.cell_matrix,
            AttributeMatrixType::Element,
        ));
    }

    fn execute(&mut self, _dca: &mut DataContainerArray) {
        self.status.notify_status(format!(
            "Created {:?} grid in '{}'",
            self.dimensions, self.data_container
        ));
    }
}
