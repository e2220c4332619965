//! Named, typed filter parameters.
//!
//! Each filter declares a `static PARAMETERS: &[ParameterDef<Self>]` table
//! pairing a name with getter/setter functions. The pipeline file loader and
//! the rename broadcast go through the table; filters never parse values
//! themselves. Only input paths ([`ParameterKind::Path`]) follow renames;
//! paths a filter creates ([`ParameterKind::CreatedPath`]) keep the name the
//! user gave them.

use crate::data::DataArrayPath;
use crate::pipeline::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameter value.
///
/// Serialized untagged, so pipeline files carry plain JSON values; paths are
/// written as `{ "data_container", "attribute_matrix", "data_array" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    IntVec(Vec<i64>),
    FloatVec(Vec<f64>),
    Path(DataArrayPath),
}

impl ParameterValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Floats, or integers widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Integer vectors; an empty float vector also qualifies.
    pub fn as_int_vec(&self) -> Option<&[i64]> {
        match self {
            ParameterValue::IntVec(v) => Some(v),
            ParameterValue::FloatVec(v) if v.is_empty() => Some(&[]),
            _ => None,
        }
    }

    pub fn as_float_vec(&self) -> Option<Vec<f64>> {
        match self {
            ParameterValue::FloatVec(v) => Some(v.clone()),
            ParameterValue::IntVec(v) => Some(v.iter().map(|&i| i as f64).collect()),
            _ => None,
        }
    }

    /// Paths, or strings in `Container|Matrix|Array` form.
    pub fn as_path(&self) -> Option<DataArrayPath> {
        match self {
            ParameterValue::Path(p) => Some(p.clone()),
            ParameterValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(v) => write!(f, "{}", v),
            ParameterValue::Int(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::String(v) => write!(f, "{:?}", v),
            ParameterValue::IntVec(v) => write!(f, "{:?}", v),
            ParameterValue::FloatVec(v) => write!(f, "{:?}", v),
            ParameterValue::Path(p) => write!(f, "{}", p),
        }
    }
}

impl From<DataArrayPath> for ParameterValue {
    fn from(path: DataArrayPath) -> Self {
        ParameterValue::Path(path)
    }
}

/// Kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
    String,
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
    IntVec,
    FloatVec,
    /// A `DataArrayPath` the filter reads; updated by rename broadcasts.
    Path,
    /// A `DataArrayPath` the filter creates. Never rewritten by renames.
    CreatedPath,
}

impl ParameterKind {
    /// Path-valued, input or created.
    pub fn is_path(self) -> bool {
        matches!(self, ParameterKind::Path | ParameterKind::CreatedPath)
    }
}

/// Getter/setter pair for one parameter of filter type `F`.
pub struct ParameterDef<F> {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
    pub get: fn(&F) -> ParameterValue,
    /// Returns a message describing why the value was rejected.
    pub set: fn(&mut F, &ParameterValue) -> Result<(), String>,
}

/// Parameter description exposed through `dyn Filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
}

/// Descriptions of every parameter in `defs`.
pub fn infos<F>(defs: &[ParameterDef<F>]) -> Vec<ParameterInfo> {
    defs.iter()
        .map(|d| ParameterInfo {
            name: d.name,
            label: d.label,
            kind: d.kind,
        })
        .collect()
}

/// Current value of parameter `name`.
pub fn get<F>(defs: &[ParameterDef<F>], filter: &F, name: &str) -> Option<ParameterValue> {
    defs.iter().find(|d| d.name == name).map(|d| (d.get)(filter))
}

/// Apply `value` to parameter `name` through its setter.
pub fn set<F>(
    defs: &[ParameterDef<F>],
    filter: &mut F,
    filter_name: &str,
    name: &str,
    value: &ParameterValue,
) -> PipelineResult<()> {
    let def = defs
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| PipelineError::Parameter {
            filter: filter_name.to_string(),
            name: name.to_string(),
            message: "no such parameter".to_string(),
        })?;
    if let ParameterKind::Choice(options) = def.kind {
        if !value.as_str().is_some_and(|s| options.contains(&s)) {
            return Err(PipelineError::Parameter {
                filter: filter_name.to_string(),
                name: name.to_string(),
                message: format!("{} is not one of {:?}", value, options),
            });
        }
    }
    (def.set)(filter, value).map_err(|message| PipelineError::Parameter {
        filter: filter_name.to_string(),
        name: name.to_string(),
        message,
    })
}

// Setter helpers used by the filter tables.

pub fn expect_bool(value: &ParameterValue) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| format!("expected a bool, got {}", value))
}

pub fn expect_int(value: &ParameterValue) -> Result<i64, String> {
    value
        .as_int()
        .ok_or_else(|| format!("expected an integer, got {}", value))
}

pub fn expect_float(value: &ParameterValue) -> Result<f64, String> {
    value
        .as_float()
        .ok_or_else(|| format!("expected a number, got {}", value))
}

pub fn expect_string(value: &ParameterValue) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("expected a string, got {}", value))
}

pub fn expect_path(value: &ParameterValue) -> Result<DataArrayPath, String> {
    value
        .as_path()
        .ok_or_else(|| format!("expected a data path, got {}", value))
}

/// Non-negative integers, e.g. dimensions.
pub fn expect_usize_vec(value: &ParameterValue) -> Result<Vec<usize>, String> {
    let values = value
        .as_int_vec()
        .ok_or_else(|| format!("expected an integer list, got {}", value))?;
    values
        .iter()
        .map(|&v| usize::try_from(v).map_err(|_| format!("negative value {}", v)))
        .collect()
}

pub fn usize_vec(values: &[usize]) -> ParameterValue {
    ParameterValue::IntVec(values.iter().map(|&v| v as i64).collect())
}
