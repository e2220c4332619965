//! Typed, shape-tagged arrays.
//!
//! A [`DataArray<T>`] stores `tuples × components` values contiguously, tuple
//! major. Arrays are owned outright by their attribute matrix; copies are
//! always explicit deep copies.
//!
//! # Main Types
//!
//! - [`ElementType`] - Runtime tag for the element type of an array
//! - [`DataArray`] - Homogeneous typed buffer with a tuple/component shape
//! - [`AnyArray`] - Type-erased array, one variant per element type
//! - [`ShapeView`] - Borrowed view exposing only the shape of an array
//!
//! # Shape-only arrays
//!
//! During preflight arrays are created without storage (`allocated == false`).
//! They carry the full shape so later filters can validate against them, but
//! content operations either do nothing or fail with
//! [`DataError::Allocation`].

use crate::data::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime element type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    String,
}

impl ElementType {
    /// Get all element types.
    pub fn all() -> &'static [ElementType] {
        &[
            ElementType::I8,
            ElementType::U8,
            ElementType::I16,
            ElementType::U16,
            ElementType::I32,
            ElementType::U32,
            ElementType::I64,
            ElementType::U64,
            ElementType::F32,
            ElementType::F64,
            ElementType::Bool,
            ElementType::String,
        ]
    }

    /// Size in bytes of one element, `None` for variable-size strings.
    pub fn size_bytes(&self) -> Option<usize> {
        match self {
            ElementType::I8 | ElementType::U8 | ElementType::Bool => Some(1),
            ElementType::I16 | ElementType::U16 => Some(2),
            ElementType::I32 | ElementType::U32 | ElementType::F32 => Some(4),
            ElementType::I64 | ElementType::U64 | ElementType::F64 => Some(8),
            ElementType::String => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ElementType::Bool | ElementType::String)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::I8 => "i8",
            ElementType::U8 => "u8",
            ElementType::I16 => "i16",
            ElementType::U16 => "u16",
            ElementType::I32 => "i32",
            ElementType::U32 => "u32",
            ElementType::I64 => "i64",
            ElementType::U64 => "u64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::Bool => "bool",
            ElementType::String => "string",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::all()
            .iter()
            .copied()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown element type '{}'", s))
    }
}

/// Element types that can be stored in a [`DataArray`].
pub trait ArrayElement: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn wrap(array: DataArray<Self>) -> AnyArray;
    fn unwrap_ref(array: &AnyArray) -> Option<&DataArray<Self>>;
    fn unwrap_mut(array: &mut AnyArray) -> Option<&mut DataArray<Self>>;

    /// Parse a value from its text form (used for initial values).
    fn parse_value(text: &str) -> Option<Self>;
}

/// Numeric element types, convertible through `f64`.
pub trait NumericElement: ArrayElement + Copy + PartialOrd {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_numeric_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ArrayElement for $t {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn wrap(array: DataArray<Self>) -> AnyArray {
                    AnyArray::$variant(array)
                }

                fn unwrap_ref(array: &AnyArray) -> Option<&DataArray<Self>> {
                    match array {
                        AnyArray::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                fn unwrap_mut(array: &mut AnyArray) -> Option<&mut DataArray<Self>> {
                    match array {
                        AnyArray::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                fn parse_value(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }

            impl NumericElement for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_numeric_element!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

impl ArrayElement for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;

    fn wrap(array: DataArray<Self>) -> AnyArray {
        AnyArray::Bool(array)
    }

    fn unwrap_ref(array: &AnyArray) -> Option<&DataArray<Self>> {
        match array {
            AnyArray::Bool(a) => Some(a),
            _ => None,
        }
    }

    fn unwrap_mut(array: &mut AnyArray) -> Option<&mut DataArray<Self>> {
        match array {
            AnyArray::Bool(a) => Some(a),
            _ => None,
        }
    }

    fn parse_value(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ArrayElement for String {
    const ELEMENT_TYPE: ElementType = ElementType::String;

    fn wrap(array: DataArray<Self>) -> AnyArray {
        AnyArray::String(array)
    }

    fn unwrap_ref(array: &AnyArray) -> Option<&DataArray<Self>> {
        match array {
            AnyArray::String(a) => Some(a),
            _ => None,
        }
    }

    fn unwrap_mut(array: &mut AnyArray) -> Option<&mut DataArray<Self>> {
        match array {
            AnyArray::String(a) => Some(a),
            _ => None,
        }
    }

    fn parse_value(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

/// Run `$body` with `$T` bound to the Rust type for an [`ElementType`].
macro_rules! with_element_type {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::data::array::ElementType::I8 => {
                type $T = i8;
                $body
            }
            $crate::data::array::ElementType::U8 => {
                type $T = u8;
                $body
            }
            $crate::data::array::ElementType::I16 => {
                type $T = i16;
                $body
            }
            $crate::data::array::ElementType::U16 => {
                type $T = u16;
                $body
            }
            $crate::data::array::ElementType::I32 => {
                type $T = i32;
                $body
            }
            $crate::data::array::ElementType::U32 => {
                type $T = u32;
                $body
            }
            $crate::data::array::ElementType::I64 => {
                type $T = i64;
                $body
            }
            $crate::data::array::ElementType::U64 => {
                type $T = u64;
                $body
            }
            $crate::data::array::ElementType::F32 => {
                type $T = f32;
                $body
            }
            $crate::data::array::ElementType::F64 => {
                type $T = f64;
                $body
            }
            $crate::data::array::ElementType::Bool => {
                type $T = bool;
                $body
            }
            $crate::data::array::ElementType::String => {
                type $T = String;
                $body
            }
        }
    };
}
pub(crate) use with_element_type;

/// Match an [`AnyArray`] binding the inner typed array to `$a` for every
/// variant.
macro_rules! dispatch {
    ($array:expr, $a:ident => $body:expr) => {
        match $array {
            AnyArray::I8($a) => $body,
            AnyArray::U8($a) => $body,
            AnyArray::I16($a) => $body,
            AnyArray::U16($a) => $body,
            AnyArray::I32($a) => $body,
            AnyArray::U32($a) => $body,
            AnyArray::I64($a) => $body,
            AnyArray::U64($a) => $body,
            AnyArray::F32($a) => $body,
            AnyArray::F64($a) => $body,
            AnyArray::Bool($a) => $body,
            AnyArray::String($a) => $body,
        }
    };
}

/// Match an [`AnyArray`] binding numeric variants to `$a`; bool and string
/// arrays evaluate `$other`.
macro_rules! dispatch_numeric {
    ($array:expr, $a:ident => $body:expr, _ => $other:expr) => {
        match $array {
            $crate::data::array::AnyArray::I8($a) => $body,
            $crate::data::array::AnyArray::U8($a) => $body,
            $crate::data::array::AnyArray::I16($a) => $body,
            $crate::data::array::AnyArray::U16($a) => $body,
            $crate::data::array::AnyArray::I32($a) => $body,
            $crate::data::array::AnyArray::U32($a) => $body,
            $crate::data::array::AnyArray::I64($a) => $body,
            $crate::data::array::AnyArray::U64($a) => $body,
            $crate::data::array::AnyArray::F32($a) => $body,
            $crate::data::array::AnyArray::F64($a) => $body,
            $crate::data::array::AnyArray::Bool(_) | $crate::data::array::AnyArray::String(_) => {
                $other
            }
        }
    };
}
pub(crate) use dispatch_numeric;

/// Serializable shape summary of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayInfo {
    pub name: String,
    pub element_type: ElementType,
    pub number_of_tuples: usize,
    pub component_dims: Vec<usize>,
    pub allocated: bool,
}

/// End of the tuple range `offset..offset + count`, if it fits in `tuples`.
fn checked_end(offset: usize, count: usize, tuples: usize) -> DataResult<usize> {
    match offset.checked_add(count) {
        Some(end) if end <= tuples => Ok(end),
        end => Err(DataError::IndexOutOfRange {
            index: end.unwrap_or(usize::MAX),
            size: tuples,
        }),
    }
}

/// Homogeneous typed buffer of `tuples × components` values.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray<T> {
    name: String,
    number_of_tuples: usize,
    component_dims: Vec<usize>,
    data: Vec<T>,
    allocated: bool,
}

impl<T: ArrayElement> DataArray<T> {
    /// Create an array of `tuples` tuples, each shaped by `component_dims`.
    ///
    /// With `allocate == false` only the shape is recorded.
    pub fn create(
        tuples: usize,
        component_dims: &[usize],
        name: impl Into<String>,
        allocate: bool,
    ) -> DataResult<Self> {
        let name = name.into();
        if component_dims.is_empty() || component_dims.contains(&0) {
            return Err(DataError::Allocation {
                name,
                message: format!("invalid component dimensions {:?}", component_dims),
            });
        }
        let mut array = Self {
            name,
            number_of_tuples: tuples,
            component_dims: component_dims.to_vec(),
            data: Vec::new(),
            allocated: false,
        };
        if allocate {
            array.allocate()?;
        }
        Ok(array)
    }

    /// Create an allocated single-component array holding `values`.
    pub fn from_vec(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            number_of_tuples: values.len(),
            component_dims: vec![1],
            data: values,
            allocated: true,
        }
    }

    /// Create an allocated array from tuple-major `values`.
    pub fn from_tuples(
        name: impl Into<String>,
        component_dims: &[usize],
        values: Vec<T>,
    ) -> DataResult<Self> {
        let mut array = Self::create(0, component_dims, name, false)?;
        let components = array.number_of_components();
        if values.len() % components != 0 {
            return Err(DataError::ShapeMismatch(format!(
                "{} values do not divide into tuples of {} components",
                values.len(),
                components
            )));
        }
        array.number_of_tuples = values.len() / components;
        array.data = values;
        array.allocated = true;
        Ok(array)
    }

    pub fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn number_of_tuples(&self) -> usize {
        self.number_of_tuples
    }

    /// Components per tuple (product of the component dimensions).
    pub fn number_of_components(&self) -> usize {
        self.component_dims.iter().product()
    }

    pub fn component_dims(&self) -> &[usize] {
        &self.component_dims
    }

    /// Total element count implied by the shape.
    pub fn size(&self) -> usize {
        self.number_of_tuples * self.number_of_components()
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Give a shape-only array zero-filled storage. No-op if already allocated.
    pub fn allocate(&mut self) -> DataResult<()> {
        if self.allocated {
            return Ok(());
        }
        let total = self
            .number_of_tuples
            .checked_mul(self.number_of_components())
            .ok_or_else(|| DataError::Allocation {
                name: self.name.clone(),
                message: "element count overflows usize".to_string(),
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|e| DataError::Allocation {
                name: self.name.clone(),
                message: e.to_string(),
            })?;
        data.resize(total, T::default());
        self.data = data;
        self.allocated = true;
        Ok(())
    }

    fn ensure_allocated(&self) -> DataResult<()> {
        if self.allocated {
            Ok(())
        } else {
            Err(DataError::Allocation {
                name: self.name.clone(),
                message: "array has no storage".to_string(),
            })
        }
    }

    fn check_tuple(&self, index: usize) -> DataResult<()> {
        if index < self.number_of_tuples {
            Ok(())
        } else {
            Err(DataError::IndexOutOfRange {
                index,
                size: self.number_of_tuples,
            })
        }
    }

    /// Flat element storage (empty for shape-only arrays).
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Element at flat index `index`.
    #[inline]
    pub fn value(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn set_value(&mut self, index: usize, value: T) -> DataResult<()> {
        self.ensure_allocated()?;
        let size = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(DataError::IndexOutOfRange { index, size })?;
        *slot = value;
        Ok(())
    }

    /// Components of tuple `index`.
    pub fn tuple(&self, index: usize) -> Option<&[T]> {
        if !self.allocated || index >= self.number_of_tuples {
            return None;
        }
        let n = self.number_of_components();
        Some(&self.data[index * n..(index + 1) * n])
    }

    pub fn tuple_mut(&mut self, index: usize) -> Option<&mut [T]> {
        if !self.allocated || index >= self.number_of_tuples {
            return None;
        }
        let n = self.number_of_components();
        Some(&mut self.data[index * n..(index + 1) * n])
    }

    /// Iterate over tuples as component slices.
    pub fn tuples(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.number_of_components())
    }

    /// Set every element to `value`. Shape-only arrays are left untouched.
    pub fn fill(&mut self, value: T) {
        for slot in self.data.iter_mut() {
            *slot = value.clone();
        }
    }

    /// Change the tuple count, keeping the overlapping prefix and
    /// zero-filling new tuples.
    pub fn resize_tuples(&mut self, tuples: usize) -> DataResult<()> {
        if self.allocated {
            let total = tuples
                .checked_mul(self.number_of_components())
                .ok_or_else(|| DataError::Allocation {
                    name: self.name.clone(),
                    message: "element count overflows usize".to_string(),
                })?;
            if total > self.data.len() {
                self.data
                    .try_reserve_exact(total - self.data.len())
                    .map_err(|e| DataError::Allocation {
                        name: self.name.clone(),
                        message: e.to_string(),
                    })?;
            }
            self.data.resize(total, T::default());
        }
        self.number_of_tuples = tuples;
        Ok(())
    }

    /// Remove the tuples at `indices`, shifting the remaining tuples down.
    ///
    /// Indices may be given in any order and may repeat. If any index is out
    /// of range the array is left unchanged.
    pub fn erase_tuples(&mut self, indices: &[usize]) -> DataResult<()> {
        if indices.is_empty() {
            return Ok(());
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&last) = sorted.last() {
            self.check_tuple(last)?;
        }

        if self.allocated {
            let n = self.number_of_components();
            let mut erase = sorted.iter().peekable();
            let mut write = 0;
            for read in 0..self.number_of_tuples {
                if erase.peek() == Some(&&read) {
                    erase.next();
                    continue;
                }
                if write != read {
                    for c in 0..n {
                        self.data.swap(write * n + c, read * n + c);
                    }
                }
                write += 1;
            }
            self.data.truncate(write * n);
        }
        self.number_of_tuples -= sorted.len();
        Ok(())
    }

    /// Copy all components of tuple `src` over tuple `dst`.
    pub fn copy_tuple(&mut self, src: usize, dst: usize) -> DataResult<()> {
        self.check_tuple(src)?;
        self.check_tuple(dst)?;
        self.ensure_allocated()?;
        if src == dst {
            return Ok(());
        }
        let n = self.number_of_components();
        for c in 0..n {
            let value = self.data[src * n + c].clone();
            self.data[dst * n + c] = value;
        }
        Ok(())
    }

    /// Copy `count` tuples from `src` starting at `src_offset` into this
    /// array starting at `dst_offset`.
    pub fn copy_from(
        &mut self,
        dst_offset: usize,
        src: &DataArray<T>,
        src_offset: usize,
        count: usize,
    ) -> DataResult<()> {
        if src.number_of_components() != self.number_of_components() {
            return Err(DataError::ShapeMismatch(format!(
                "cannot copy {}-component tuples into {}-component array '{}'",
                src.number_of_components(),
                self.number_of_components(),
                self.name
            )));
        }
        let src_end = checked_end(src_offset, count, src.number_of_tuples)?;
        let dst_end = checked_end(dst_offset, count, self.number_of_tuples)?;
        self.ensure_allocated()?;
        src.ensure_allocated()?;
        let n = self.number_of_components();
        self.data[dst_offset * n..dst_end * n]
            .clone_from_slice(&src.data[src_offset * n..src_end * n]);
        Ok(())
    }

    /// Independent duplicate. With `allocate == false` the copy is
    /// shape-only.
    pub fn deep_copy(&self, allocate: bool) -> DataResult<Self> {
        if !allocate {
            return Ok(Self {
                name: self.name.clone(),
                number_of_tuples: self.number_of_tuples,
                component_dims: self.component_dims.clone(),
                data: Vec::new(),
                allocated: false,
            });
        }
        if self.allocated {
            return Ok(self.clone());
        }
        let mut copy = self.deep_copy(false)?;
        copy.allocate()?;
        Ok(copy)
    }

    pub fn info(&self) -> ArrayInfo {
        ArrayInfo {
            name: self.name.clone(),
            element_type: T::ELEMENT_TYPE,
            number_of_tuples: self.number_of_tuples,
            component_dims: self.component_dims.clone(),
            allocated: self.allocated,
        }
    }
}

/// Type-erased array: one variant per [`ElementType`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnyArray {
    I8(DataArray<i8>),
    U8(DataArray<u8>),
    I16(DataArray<i16>),
    U16(DataArray<u16>),
    I32(DataArray<i32>),
    U32(DataArray<u32>),
    I64(DataArray<i64>),
    U64(DataArray<u64>),
    F32(DataArray<f32>),
    F64(DataArray<f64>),
    Bool(DataArray<bool>),
    String(DataArray<String>),
}

impl AnyArray {
    /// Create an array of the given runtime element type.
    pub fn create(
        element_type: ElementType,
        tuples: usize,
        component_dims: &[usize],
        name: impl Into<String>,
        allocate: bool,
    ) -> DataResult<Self> {
        let name = name.into();
        with_element_type!(element_type, T => {
            DataArray::<T>::create(tuples, component_dims, name, allocate).map(T::wrap)
        })
    }

    pub fn element_type(&self) -> ElementType {
        dispatch!(self, a => a.element_type())
    }

    pub fn name(&self) -> &str {
        dispatch!(self, a => a.name())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        dispatch!(self, a => a.set_name(name))
    }

    pub fn number_of_tuples(&self) -> usize {
        dispatch!(self, a => a.number_of_tuples())
    }

    pub fn number_of_components(&self) -> usize {
        dispatch!(self, a => a.number_of_components())
    }

    pub fn component_dims(&self) -> &[usize] {
        dispatch!(self, a => a.component_dims())
    }

    pub fn is_allocated(&self) -> bool {
        dispatch!(self, a => a.is_allocated())
    }

    pub fn allocate(&mut self) -> DataResult<()> {
        dispatch!(self, a => a.allocate())
    }

    pub fn resize_tuples(&mut self, tuples: usize) -> DataResult<()> {
        dispatch!(self, a => a.resize_tuples(tuples))
    }

    pub fn erase_tuples(&mut self, indices: &[usize]) -> DataResult<()> {
        dispatch!(self, a => a.erase_tuples(indices))
    }

    pub fn copy_tuple(&mut self, src: usize, dst: usize) -> DataResult<()> {
        dispatch!(self, a => a.copy_tuple(src, dst))
    }

    /// Copy tuples from another array of the same element type.
    pub fn copy_from_array(
        &mut self,
        dst_offset: usize,
        src: &AnyArray,
        src_offset: usize,
        count: usize,
    ) -> DataResult<()> {
        let found = src.element_type();
        dispatch!(self, a => match ArrayElement::unwrap_ref(src) {
            Some(typed) => a.copy_from(dst_offset, typed, src_offset, count),
            None => Err(DataError::TypeMismatch {
                expected: a.element_type(),
                found,
            }),
        })
    }

    pub fn deep_copy(&self, allocate: bool) -> DataResult<AnyArray> {
        dispatch!(self, a => a.deep_copy(allocate).map(ArrayElement::wrap))
    }

    pub fn info(&self) -> ArrayInfo {
        dispatch!(self, a => a.info())
    }

    pub fn downcast_ref<T: ArrayElement>(&self) -> Option<&DataArray<T>> {
        T::unwrap_ref(self)
    }

    pub fn downcast_mut<T: ArrayElement>(&mut self) -> Option<&mut DataArray<T>> {
        T::unwrap_mut(self)
    }

    pub fn shape_view(&self) -> ShapeView<'_> {
        ShapeView { array: self }
    }
}

impl<T: ArrayElement> From<DataArray<T>> for AnyArray {
    fn from(array: DataArray<T>) -> Self {
        T::wrap(array)
    }
}

/// Read-only borrowed view of an array's shape. Grants no data access.
#[derive(Debug, Clone, Copy)]
pub struct ShapeView<'a> {
    array: &'a AnyArray,
}

impl<'a> ShapeView<'a> {
    pub fn name(&self) -> &'a str {
        self.array.name()
    }

    pub fn element_type(&self) -> ElementType {
        self.array.element_type()
    }

    pub fn number_of_tuples(&self) -> usize {
        self.array.number_of_tuples()
    }

    pub fn number_of_components(&self) -> usize {
        self.array.number_of_components()
    }

    pub fn component_dims(&self) -> &'a [usize] {
        self.array.component_dims()
    }

    pub fn is_allocated(&self) -> bool {
        self.array.is_allocated()
    }
}
