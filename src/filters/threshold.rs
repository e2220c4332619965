//! Builds a boolean mask by comparing a numeric array against a constant.

use super::{filter_common, INVALID_PARAMETER};
use crate::data::array::dispatch_numeric;
use crate::data::{
    DataArray, DataArrayPath, DataContainerArray, DataError, DataResult, ElementType,
    NumericElement,
};
use crate::parallel::ParallelDataAlgorithm;
use crate::pipeline::parameter::{
    expect_float, expect_path, expect_string, ParameterDef, ParameterKind, ParameterValue,
};
use crate::pipeline::{Filter, FilterStatus};
use std::fmt;

const NAME: &str = "ThresholdArray";
const LABEL: &str = "Threshold Array";
const UUID: &str = "a8b0c2d4-1f3e-4b6a-9c7d-5e2f8a0b1c93";

const COMPARISONS: &[&str] = &["<", "<=", ">", ">=", "==", "!="];

static PARAMETERS: &[ParameterDef<ThresholdArray>] = &[
    ParameterDef {
        name: "input_array",
        label: "Input Attribute Array",
        kind: ParameterKind::Path,
        get: |f| ParameterValue::Path(f.input_array.clone()),
        set: |f, v| {
            f.input_array = expect_path(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "comparison",
        label: "Comparison Operator",
        kind: ParameterKind::Choice(COMPARISONS),
        get: |f| ParameterValue::String(f.comparison.to_string()),
        set: |f, v| {
            f.comparison = Comparison::parse(&expect_string(v)?)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "value",
        label: "Comparison Value",
        kind: ParameterKind::Float,
        get: |f| ParameterValue::Float(f.value),
        set: |f, v| {
            f.value = expect_float(v)?;
            Ok(())
        },
    },
    ParameterDef {
        name: "output_array_name",
        label: "Output Mask Name",
        kind: ParameterKind::String,
        get: |f| ParameterValue::String(f.output_array_name.clone()),
        set: |f, v| {
            f.output_array_name = expect_string(v)?;
            Ok(())
        },
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl Comparison {
    fn parse(text: &str) -> Result<Self, String> {
        match text.trim() {
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessEqual),
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterEqual),
            "==" => Ok(Comparison::Equal),
            "!=" => Ok(Comparison::NotEqual),
            other => Err(format!("unknown comparison '{}'", other)),
        }
    }

    #[inline]
    pub fn test(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
        };
        f.write_str(symbol)
    }
}

/// Writes `input <op> value` into a bool array next to the input.
pub struct ThresholdArray {
    status: FilterStatus,
    pub input_array: DataArrayPath,
    pub comparison: Comparison,
    pub value: f64,
    pub output_array_name: String,
}

impl ThresholdArray {
    pub fn new() -> Self {
        Self {
            status: FilterStatus::new(),
            input_array: DataArrayPath::default(),
            comparison: Comparison::Greater,
            value: 0.0,
            output_array_name: "Mask".to_string(),
        }
    }

    fn output_path(&self) -> DataArrayPath {
        self.input_array.with_array(self.output_array_name.as_str())
    }

    fn compute(&self, dca: &DataContainerArray, mask: &mut DataArray<bool>) -> DataResult<()> {
        let input = dca
            .attribute_array(&self.input_array)
            .ok_or_else(|| DataError::PathNotFound(self.input_array.clone()))?;
        let algorithm = ParallelDataAlgorithm::with_context(
            0..input.number_of_tuples(),
            self.status.parallel().clone(),
        );
        let (comparison, value) = (self.comparison, self.value);
        dispatch_numeric!(input, a => {
            let values = a.as_slice();
            algorithm.execute_chunks(mask.as_mut_slice(), 1, |range, chunk| {
                for (out, &x) in chunk.iter_mut().zip(&values[range]) {
                    *out = comparison.test(x.to_f64(), value);
                }
            })
        }, _ => Err(DataError::TypeMismatch {
            expected: ElementType::F64,
            found: input.element_type(),
        }))
    }
}

impl Default for ThresholdArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for ThresholdArray {
    filter_common!("Processing");

    fn data_check(&mut self, dca: &mut DataContainerArray) {
        if self.output_array_name.is_empty() {
            self.status.set_parameter_error(
                INVALID_PARAMETER,
                "output_array_name",
                "Output mask name must be set",
            );
            return;
        }
        let Some(view) = self.status.check(dca.shape_view(&self.input_array)) else {
            return;
        };
        let (element_type, components) = (view.element_type(), view.number_of_components());
        if !element_type.is_numeric() {
            self.status.set_parameter_error(
                INVALID_PARAMETER - 1,
                "input_array",
                format!(
                    "'{}' holds {} values, a numeric array is required",
                    self.input_array, element_type
                ),
            );
            return;
        }
        if components != 1 {
            let err = DataError::ComponentMismatch {
                path: self.input_array.clone(),
                expected: 1,
                found: components,
            };
            self.status.set_data_error(&err);
            return;
        }

        let allocate = self.status.allocate();
        self.status.check(
            dca.create_non_prereq_array::<bool>(&self.output_path(), &[1], allocate),
        );
    }

    fn execute(&mut self, dca: &mut DataContainerArray) {
        let output_path = self.output_path();
        let Some(mut output) = dca
            .attribute_matrix_mut(&output_path)
            .and_then(|am| am.remove_attribute_array(&output_path.data_array))
        else {
            self.status
                .set_data_error(&DataError::PathNotFound(output_path));
            return;
        };

        let found = output.element_type();
        let result = match output.downcast_mut::<bool>() {
            Some(mask) => self.compute(dca, mask),
            None => Err(DataError::TypeMismatch {
                expected: ElementType::Bool,
                found,
            }),
        };
        let restored = match dca.attribute_matrix_mut(&output_path) {
            Some(am) => am.add_attribute_array(output),
            None => Err(DataError::PathNotFound(output_path.matrix_path())),
        };
        if self.status.check(result).is_some() {
            self.status.check(restored);
        }
    }
}
