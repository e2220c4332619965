//! Attribute matrices: named bundles of arrays sharing one tuple shape.

use crate::data::array::{AnyArray, ArrayElement, DataArray};
use crate::data::error::{DataError, DataResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of entity described by a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttributeMatrixType {
    /// One tuple per geometry element (voxel, vertex).
    Element,
    /// One tuple per feature (grain).
    Feature,
    /// One tuple per ensemble (phase).
    Ensemble,
    #[default]
    Generic,
}

impl AttributeMatrixType {
    pub fn display_name(&self) -> &'static str {
        match self {
            AttributeMatrixType::Element => "Element",
            AttributeMatrixType::Feature => "Feature",
            AttributeMatrixType::Ensemble => "Ensemble",
            AttributeMatrixType::Generic => "Generic",
        }
    }
}

impl std::fmt::Display for AttributeMatrixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A name → array map where every array has `product(tuple_dims)` tuples.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMatrix {
    name: String,
    tuple_dims: Vec<usize>,
    matrix_type: AttributeMatrixType,
    arrays: BTreeMap<String, AnyArray>,
}

impl AttributeMatrix {
    pub fn new(
        tuple_dims: &[usize],
        name: impl Into<String>,
        matrix_type: AttributeMatrixType,
    ) -> Self {
        Self {
            name: name.into(),
            tuple_dims: tuple_dims.to_vec(),
            matrix_type,
            arrays: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn matrix_type(&self) -> AttributeMatrixType {
        self.matrix_type
    }

    pub fn tuple_dims(&self) -> &[usize] {
        &self.tuple_dims
    }

    pub fn number_of_tuples(&self) -> usize {
        self.tuple_dims.iter().product()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Array names in sorted order.
    pub fn attribute_array_names(&self) -> Vec<String> {
        self.arrays.keys().cloned().collect()
    }

    pub fn attribute_arrays(&self) -> impl Iterator<Item = &AnyArray> {
        self.arrays.values()
    }

    pub fn attribute_array(&self, name: &str) -> Option<&AnyArray> {
        self.arrays.get(name)
    }

    pub fn attribute_array_mut(&mut self, name: &str) -> Option<&mut AnyArray> {
        self.arrays.get_mut(name)
    }

    /// Typed lookup; `None` if missing or of another element type.
    pub fn array<T: ArrayElement>(&self, name: &str) -> Option<&DataArray<T>> {
        self.arrays.get(name).and_then(AnyArray::downcast_ref)
    }

    pub fn array_mut<T: ArrayElement>(&mut self, name: &str) -> Option<&mut DataArray<T>> {
        self.arrays.get_mut(name).and_then(AnyArray::downcast_mut)
    }

    /// Insert an existing array, keyed by its own name.
    pub fn add_attribute_array(&mut self, array: impl Into<AnyArray>) -> DataResult<()> {
        let array = array.into();
        if self.arrays.contains_key(array.name()) {
            return Err(DataError::NameCollision(array.name().to_string()));
        }
        if array.number_of_tuples() != self.number_of_tuples() {
            return Err(DataError::ShapeMismatch(format!(
                "array '{}' has {} tuples, matrix '{}' requires {}",
                array.name(),
                array.number_of_tuples(),
                self.name,
                self.number_of_tuples()
            )));
        }
        self.arrays.insert(array.name().to_string(), array);
        Ok(())
    }

    /// Create an array sized to this matrix and insert it.
    pub fn create_and_add_attribute_array<T: ArrayElement>(
        &mut self,
        name: &str,
        component_dims: &[usize],
        allocate: bool,
    ) -> DataResult<&mut DataArray<T>> {
        if self.arrays.contains_key(name) {
            return Err(DataError::NameCollision(name.to_string()));
        }
        let array = DataArray::<T>::create(self.number_of_tuples(), component_dims, name, allocate)?;
        self.arrays.insert(name.to_string(), T::wrap(array));
        self.array_mut::<T>(name).ok_or_else(|| {
            DataError::ShapeMismatch(format!("array '{}' vanished after insertion", name))
        })
    }

    pub fn remove_attribute_array(&mut self, name: &str) -> Option<AnyArray> {
        self.arrays.remove(name)
    }

    /// Rename an array. Returns `false` if `old` is missing or `new` is
    /// already taken.
    pub fn rename_attribute_array(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.arrays.contains_key(old);
        }
        if self.arrays.contains_key(new) {
            return false;
        }
        match self.arrays.remove(old) {
            Some(mut array) => {
                array.set_name(new);
                self.arrays.insert(new.to_string(), array);
                true
            }
            None => false,
        }
    }

    /// Change the tuple dimensions and resize every array to match.
    ///
    /// Data in the overlapping flattened prefix is preserved; new tuples are
    /// zero-filled.
    pub fn resize_attribute_arrays(&mut self, tuple_dims: &[usize]) -> DataResult<()> {
        let tuples: usize = tuple_dims.iter().product();
        for array in self.arrays.values_mut() {
            array.resize_tuples(tuples)?;
        }
        self.tuple_dims = tuple_dims.to_vec();
        Ok(())
    }

    /// Erase the given tuples from every array and collapse the tuple
    /// dimensions to `[remaining]`.
    ///
    /// Bounds are checked up front, so a failure leaves the matrix unchanged.
    pub fn remove_tuples(&mut self, indices: &[usize]) -> DataResult<()> {
        let tuples = self.number_of_tuples();
        if let Some(&index) = indices.iter().find(|&&i| i >= tuples) {
            return Err(DataError::IndexOutOfRange {
                index,
                size: tuples,
            });
        }
        let mut unique = indices.to_vec();
        unique.sort_unstable();
        unique.dedup();
        for array in self.arrays.values_mut() {
            array.erase_tuples(&unique)?;
        }
        self.tuple_dims = vec![tuples - unique.len()];
        Ok(())
    }

    /// Allocate storage for every shape-only array.
    pub fn allocate_all(&mut self) -> DataResult<()> {
        self.arrays.values_mut().try_for_each(AnyArray::allocate)
    }

    pub fn deep_copy(&self, allocate: bool) -> DataResult<Self> {
        let arrays = self
            .arrays
            .iter()
            .map(|(name, array)| Ok((name.clone(), array.deep_copy(allocate)?)))
            .collect::<DataResult<BTreeMap<_, _>>>()?;
        Ok(Self {
            name: self.name.clone(),
            tuple_dims: self.tuple_dims.clone(),
            matrix_type: self.matrix_type,
            arrays,
        })
    }
}
