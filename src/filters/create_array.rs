//! Creates a typed array filled with an initial value.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::array::with_element_type;
use crate::data::{ArrayElement, DataArrayPath, DataContainerArray, DataError, ElementType};
use crate::pipeline::parameter::{
    expect_path, expect_string, expect_usize_vec, usize_vec, ParameterDef, ParameterKind,
    ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};

const NAME: &str = "CreateDataArray";
const LABEL: &str = "Create Data Array";
const UUID: &str = "77f392fb-c1eb-4ee2-9a5e-1c8d0b6f4a12";

const ELEMENT_TYPES: &[&str] = &[
    "i8", "u8", "i16", "u16", "i32", "u32", "i64", "u64", "f32", "f64", "bool", "string",
];

static PARAMETERS: &[ParameterDef<CreateDataArray>] = &[
    ParameterDef {
        name: "created_array",
        label: "Created Attribute Array",
        kind: ParameterKind::CreatedPath,
        get: |f| ParameterValue::Path(f.created_array.clone()),
        set: |f, v| {
            f.created_array = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "element_type",
        label: "Scalar Type",
        kind: ParameterKind::Choice(ELEMENT_TYPES),
        get: |f| ParameterValue::String(f.element_type.to_string()),
        set: |f, v| {
            f.element_type = expect_string(v)?.parse()?;
            Ok(())
        },
    },
    ParameterDef {
        name: "component_dimensions",
        label: "Component Dimensions",
        kind: ParameterKind::IntVec,
        get: |f| usize_vec(&f.component_dims),
        set: |f, v| {
            f.component_dims = expect_usize_vec(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "initial_value",
        label: "Initialization Value",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.initial_value.clone()),
        set: |f, v| {
            f.initial_value = expect_string(v)?;
            Ok(())
        },
    },
];

pub struct CreateDataArray {
    status: FilterStatus,
    pub created_array: DataArrayPath,
    pub element_type: ElementType,
    pub component_dims: Vec<usize>,
    /// Parsed per element type; `"0"`, `"1.5"`, `"true"`, ...
    pub initial_value: String,
}

impl CreateDataArray {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            created_array: DataArrayPath::default(),
            element_type: ElementType::F32,
            component_dims: vec![1],
            initial_value: "0".to_string(),
        }
    }
}

impl Default for CreateDataArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for CreateDataArray {
    filter_common!("Core");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if !self.created_array.is_array_path() {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "created_array",
                format!("'{}' does not name an array", self.created_array),
            );
            return;
        }
        let parses = with_element_type!(self.element_type, T => {
            T::parse_value(&self.initial_value).is_some()
        });
        if !parses {
            self.status.set_parameter_error(
                INVALID_PARAMETER - 1,
                "initial_value",
                format!(
                    "'{}' is not a valid {} value",
                    self.initial_value, self.element_type
                ),
            );
            return;
        }

        let allocate = self.status.allocate();
        let created = with_element_type!(self.element_type, T => {
            dca.create_non_prereq_array::<T>(&self.created_array, &self.component_dims, allocate)
                .map(|_| ())
        });
        self.status.check(created);
    }

    fn execute(&mut self, dca: &mut DataContainerArray) {
        let Some(array) = dca.attribute_array_mut(&self.created_array) else {
            self.status
                .set_data_error(&DataError::PathNotFound(self.created_array.clone()));
            return;
        };
        let found = array.element_type();
        let filled = with_element_type!(self.element_type, T => {
            let Some(value) = T::parse_value(&self.initial_value) else {
                self.status.set_parameter_error(
                    INVALID_PARAMETER - 1,
                    "initial_value",
                    format!(
                        "'{}' is not a valid {} value",
                        self.initial_value, self.element_type
                    ),
                );
                return;
            };
            match array.downcast_mut::<T>() {
                Some(array) => {
                    array.fill(value);
                    Ok(())
                }
                None => Err(DataError::TypeMismatch {
                    expected: self.element_type,
                    found,
                }),
            }
        });
        self.status.check(filled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttributeMatrixType;
    use crate::pipeline::FilterState;

    fn dca() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        dca.create_data_container("Image")
            .unwrap()
            .create_attribute_matrix(&[3, 2], "Cells", AttributeMatrixType::Element)
            .unwrap();
        dca
    }

    fn filter(ty: &str, value: &str) -> CreateDataArray {
        let mut f = CreateDataArray::new();
        f.set_parameter("created_array", &ParameterValue::String("Image|Cells|Out".into()))
            .unwrap();
        f.set_parameter("element_type", &ParameterValue::String(ty.into()))
            .unwrap();
        f.set_parameter("component_dimensions", &ParameterValue::IntVec(vec![2]))
            .unwrap();
        f.set_parameter("initial_value", &ParameterValue::String(value.into()))
            .unwrap();
        f
    }

    #[test]
    fn test_creates_filled_array() {
        let mut dca = dca();
        let mut f = filter("i16", "-7");
        f.run(&mut dca);
        assert_eq!(f.status().state(), FilterState::Completed);
        let out = dca
            .get_prereq_array::<i16>(&DataArrayPath::new("Image", "Cells", "Out"), 2)
            .unwrap();
        assert_eq!(out.number_of_tuples(), 6);
        assert!(out.as_slice().iter().all(|&v| v == -7));
    }

    #[test]
    fn test_preflight_is_shape_only() {
        let mut dca = dca();
        let mut f = filter("f64", "2.5");
        f.preflight(&mut dca);
        let view = dca
            .shape_view(&DataArrayPath::new("Image", "Cells", "Out"))
            .unwrap();
        assert_eq!(view.element_type(), ElementType::F64);
        assert!(!view.is_allocated());
    }

    #[test]
    fn test_bad_initial_value() {
        let mut f = filter("u8", "300");
        f.preflight(&mut dca());
        assert_eq!(f.status().error_code(), INVALID_PARAMETER - 1);
        assert_eq!(f.status().error_property(), Some("initial_value"));
    }

    #[test]
    fn test_execute_reports_missing_or_mistyped_output() {
        let mut missing = filter("i16", "4");
        missing.execute(&mut dca());
        assert_eq!(missing.status().error_code(), -106);

        let mut dca = dca();
        dca.attribute_matrix_mut(&DataArrayPath::matrix("Image", "Cells"))
            .unwrap()
            .create_and_add_attribute_array::<f32>("Out", &[2], true)
            .unwrap();
        let mut mistyped = filter("i16", "4");
        mistyped.execute(&mut dca);
        assert_eq!(mistyped.status().error_code(), -105);
    }

    #[test]
    fn test_existing_array_collides() {
        let mut dca = dca();
        filter("i32", "0").run(&mut dca);
        let mut again = filter("i32", "0");
        again.run(&mut dca);
        assert_eq!(again.status().error_code(), -103);
        assert_eq!(again.status().error_property(), None);
    }
}
