//! Data containers and the container registry threaded through a pipeline.
//!
//! A [`DataContainerArray`] is created per pipeline run and passed to every
//! filter explicitly. All lookups go through [`DataArrayPath`] and fail with
//! [`DataError::PathNotFound`] when any level of the hierarchy is missing.

use crate::data::array::{AnyArray, ArrayElement, DataArray, ShapeView};
use crate::data::attribute_matrix::{AttributeMatrix, AttributeMatrixType};
use crate::data::error::{DataError, DataResult};
use crate::data::geometry::{Geometry, ImageGeom};
use crate::data::path::{DataArrayPath, PathRename};
use std::collections::BTreeMap;

/// A named geometry plus its attribute matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    name: String,
    geometry: Option<Geometry>,
    matrices: BTreeMap<String, AttributeMatrix>,
}

impl DataContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            matrices: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = Some(geometry);
    }

    pub fn image_geometry(&self) -> Option<&ImageGeom> {
        self.geometry.as_ref().and_then(Geometry::as_image)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.matrices.contains_key(name)
    }

    pub fn attribute_matrix_names(&self) -> Vec<String> {
        self.matrices.keys().cloned().collect()
    }

    pub fn attribute_matrices(&self) -> impl Iterator<Item = &AttributeMatrix> {
        self.matrices.values()
    }

    pub fn attribute_matrix(&self, name: &str) -> Option<&AttributeMatrix> {
        self.matrices.get(name)
    }

    pub fn attribute_matrix_mut(&mut self, name: &str) -> Option<&mut AttributeMatrix> {
        self.matrices.get_mut(name)
    }

    pub fn add_attribute_matrix(&mut self, matrix: AttributeMatrix) -> DataResult<()> {
        if self.matrices.contains_key(matrix.name()) {
            return Err(DataError::NameCollision(matrix.name().to_string()));
        }
        self.matrices.insert(matrix.name().to_string(), matrix);
        Ok(())
    }

    pub fn create_attribute_matrix(
        &mut self,
        tuple_dims: &[usize],
        name: &str,
        matrix_type: AttributeMatrixType,
    ) -> DataResult<&mut AttributeMatrix> {
        self.add_attribute_matrix(AttributeMatrix::new(tuple_dims, name, matrix_type))?;
        self.matrices
            .get_mut(name)
            .ok_or_else(|| DataError::PathNotFound(DataArrayPath::matrix(self.name.clone(), name)))
    }

    pub fn remove_attribute_matrix(&mut self, name: &str) -> Option<AttributeMatrix> {
        self.matrices.remove(name)
    }

    /// Returns `false` if `old` is missing or `new` is taken.
    pub fn rename_attribute_matrix(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.matrices.contains_key(old);
        }
        if self.matrices.contains_key(new) {
            return false;
        }
        match self.matrices.remove(old) {
            Some(mut matrix) => {
                matrix.set_name(new);
                self.matrices.insert(new.to_string(), matrix);
                true
            }
            None => false,
        }
    }

    pub fn deep_copy(&self, allocate: bool) -> DataResult<Self> {
        let matrices = self
            .matrices
            .iter()
            .map(|(name, m)| Ok((name.clone(), m.deep_copy(allocate)?)))
            .collect::<DataResult<BTreeMap<_, _>>>()?;
        Ok(Self {
            name: self.name.clone(),
            geometry: self.geometry.clone(),
            matrices,
        })
    }
}

/// Ordered registry of data containers; one instance per pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContainerArray {
    containers: Vec<DataContainer>,
}

impl DataContainerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.containers.iter().any(|dc| dc.name == name)
    }

    /// Container names in insertion order.
    pub fn data_container_names(&self) -> Vec<String> {
        self.containers.iter().map(|dc| dc.name.clone()).collect()
    }

    pub fn data_containers(&self) -> impl Iterator<Item = &DataContainer> {
        self.containers.iter()
    }

    pub fn data_container(&self, name: &str) -> Option<&DataContainer> {
        self.containers.iter().find(|dc| dc.name == name)
    }

    pub fn data_container_mut(&mut self, name: &str) -> Option<&mut DataContainer> {
        self.containers.iter_mut().find(|dc| dc.name == name)
    }

    pub fn add_data_container(&mut self, container: DataContainer) -> DataResult<()> {
        if self.contains(&container.name) {
            return Err(DataError::NameCollision(container.name));
        }
        self.containers.push(container);
        Ok(())
    }

    pub fn create_data_container(&mut self, name: &str) -> DataResult<&mut DataContainer> {
        self.add_data_container(DataContainer::new(name))?;
        self.data_container_mut(name)
            .ok_or_else(|| DataError::PathNotFound(DataArrayPath::container(name)))
    }

    pub fn remove_data_container(&mut self, name: &str) -> Option<DataContainer> {
        let index = self.containers.iter().position(|dc| dc.name == name)?;
        Some(self.containers.remove(index))
    }

    /// Rename a container. `None` if `old` is missing or `new` is taken.
    pub fn rename_data_container(&mut self, old: &str, new: &str) -> Option<PathRename> {
        if old != new && self.contains(new) {
            return None;
        }
        let container = self.data_container_mut(old)?;
        container.name = new.to_string();
        Some(PathRename::new(
            DataArrayPath::container(old),
            DataArrayPath::container(new),
        ))
    }

    /// Rename the matrix at `path` to `new_name`.
    pub fn rename_attribute_matrix(
        &mut self,
        path: &DataArrayPath,
        new_name: &str,
    ) -> Option<PathRename> {
        let container = self.data_container_mut(&path.data_container)?;
        if !container.rename_attribute_matrix(&path.attribute_matrix, new_name) {
            return None;
        }
        Some(PathRename::new(
            path.matrix_path(),
            DataArrayPath::matrix(path.data_container.clone(), new_name),
        ))
    }

    /// Rename the array at `path` to `new_name`.
    pub fn rename_attribute_array(
        &mut self,
        path: &DataArrayPath,
        new_name: &str,
    ) -> Option<PathRename> {
        let matrix = self.attribute_matrix_mut(path)?;
        if !matrix.rename_attribute_array(&path.data_array, new_name) {
            return None;
        }
        Some(PathRename::new(path.clone(), path.with_array(new_name)))
    }

    /// Matrix named by the container and matrix parts of `path`.
    pub fn attribute_matrix(&self, path: &DataArrayPath) -> Option<&AttributeMatrix> {
        self.data_container(&path.data_container)?
            .attribute_matrix(&path.attribute_matrix)
    }

    pub fn attribute_matrix_mut(&mut self, path: &DataArrayPath) -> Option<&mut AttributeMatrix> {
        self.data_container_mut(&path.data_container)?
            .attribute_matrix_mut(&path.attribute_matrix)
    }

    pub fn does_attribute_matrix_exist(&self, path: &DataArrayPath) -> bool {
        self.attribute_matrix(path).is_some()
    }

    pub fn does_attribute_array_exist(&self, path: &DataArrayPath) -> bool {
        self.attribute_array(path).is_some()
    }

    pub fn attribute_array(&self, path: &DataArrayPath) -> Option<&AnyArray> {
        self.attribute_matrix(path)?.attribute_array(&path.data_array)
    }

    pub fn attribute_array_mut(&mut self, path: &DataArrayPath) -> Option<&mut AnyArray> {
        self.attribute_matrix_mut(path)?
            .attribute_array_mut(&path.data_array)
    }

    /// Shape of the array at `path`, without data access.
    pub fn shape_view(&self, path: &DataArrayPath) -> DataResult<ShapeView<'_>> {
        self.attribute_array(path)
            .map(AnyArray::shape_view)
            .ok_or_else(|| DataError::PathNotFound(path.clone()))
    }

    /// Matrix at `path`, optionally required to be of `matrix_type`.
    pub fn get_prereq_attribute_matrix(
        &self,
        path: &DataArrayPath,
        matrix_type: Option<AttributeMatrixType>,
    ) -> DataResult<&AttributeMatrix> {
        let matrix = self
            .attribute_matrix(path)
            .ok_or_else(|| DataError::PathNotFound(path.matrix_path()))?;
        match matrix_type {
            Some(required) if matrix.matrix_type() != required => {
                Err(DataError::ShapeMismatch(format!(
                    "matrix '{}' is of type {}, {} required",
                    path.matrix_path(),
                    matrix.matrix_type(),
                    required
                )))
            }
            _ => Ok(matrix),
        }
    }

    fn check_prereq(
        path: &DataArrayPath,
        array: Option<&AnyArray>,
        expected: crate::data::array::ElementType,
        required_components: usize,
    ) -> DataResult<()> {
        let array = array.ok_or_else(|| DataError::PathNotFound(path.clone()))?;
        if array.element_type() != expected {
            return Err(DataError::TypeMismatch {
                expected,
                found: array.element_type(),
            });
        }
        if array.number_of_components() != required_components {
            return Err(DataError::ComponentMismatch {
                path: path.clone(),
                expected: required_components,
                found: array.number_of_components(),
            });
        }
        Ok(())
    }

    /// Look up an input array, checking existence, element type and
    /// component count together.
    pub fn get_prereq_array<T: ArrayElement>(
        &self,
        path: &DataArrayPath,
        required_components: usize,
    ) -> DataResult<&DataArray<T>> {
        let array = self.attribute_array(path);
        Self::check_prereq(path, array, T::ELEMENT_TYPE, required_components)?;
        array
            .and_then(AnyArray::downcast_ref)
            .ok_or_else(|| DataError::PathNotFound(path.clone()))
    }

    pub fn get_prereq_array_mut<T: ArrayElement>(
        &mut self,
        path: &DataArrayPath,
        required_components: usize,
    ) -> DataResult<&mut DataArray<T>> {
        Self::check_prereq(
            path,
            self.attribute_array(path),
            T::ELEMENT_TYPE,
            required_components,
        )?;
        self.attribute_array_mut(path)
            .and_then(AnyArray::downcast_mut)
            .ok_or_else(|| DataError::PathNotFound(path.clone()))
    }

    /// Create an output array in the matrix named by `path`.
    pub fn create_non_prereq_array<T: ArrayElement>(
        &mut self,
        path: &DataArrayPath,
        component_dims: &[usize],
        allocate: bool,
    ) -> DataResult<&mut DataArray<T>> {
        let matrix = self
            .attribute_matrix_mut(path)
            .ok_or_else(|| DataError::PathNotFound(path.matrix_path()))?;
        matrix.create_and_add_attribute_array::<T>(&path.data_array, component_dims, allocate)
    }

    pub fn deep_copy(&self, allocate: bool) -> DataResult<Self> {
        let containers = self
            .containers
            .iter()
            .map(|dc| dc.deep_copy(allocate))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self { containers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::ElementType;

    fn sample() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        let dc = dca.create_data_container("Image").unwrap();
        dc.set_geometry(Geometry::Image(ImageGeom::new([2, 2, 1])));
        let cells = dc
            .create_attribute_matrix(&[2, 2, 1], "Cells", AttributeMatrixType::Element)
            .unwrap();
        cells
            .create_and_add_attribute_array::<i32>("FeatureIds", &[1], true)
            .unwrap();
        dca
    }

    #[test]
    fn test_container_names_unique() {
        let mut dca = sample();
        assert!(matches!(
            dca.create_data_container("Image"),
            Err(DataError::NameCollision(_))
        ));
        dca.create_data_container("Second").unwrap();
        assert_eq!(dca.data_container_names(), vec!["Image", "Second"]);
    }

    #[test]
    fn test_path_lookups() {
        let dca = sample();
        let path = DataArrayPath::new("Image", "Cells", "FeatureIds");
        assert!(dca.does_attribute_matrix_exist(&path));
        assert!(dca.does_attribute_array_exist(&path));
        assert!(!dca.does_attribute_matrix_exist(&DataArrayPath::matrix("Image", "Nope")));
        assert!(dca.attribute_matrix(&DataArrayPath::matrix("Nope", "Cells")).is_none());
        assert_eq!(dca.shape_view(&path).unwrap().number_of_tuples(), 4);
    }

    #[test]
    fn test_get_prereq_array() {
        let dca = sample();
        let path = DataArrayPath::new("Image", "Cells", "FeatureIds");
        assert_eq!(dca.get_prereq_array::<i32>(&path, 1).unwrap().number_of_tuples(), 4);

        assert_eq!(
            dca.get_prereq_array::<f32>(&path, 1).unwrap_err(),
            DataError::TypeMismatch {
                expected: ElementType::F32,
                found: ElementType::I32
            }
        );
        assert!(matches!(
            dca.get_prereq_array::<i32>(&path, 3),
            Err(DataError::ComponentMismatch { expected: 3, found: 1, .. })
        ));

        let missing = path.with_array("Phases");
        assert_eq!(
            dca.get_prereq_array::<i32>(&missing, 1).unwrap_err(),
            DataError::PathNotFound(missing)
        );
    }

    #[test]
    fn test_prereq_matrix_type() {
        let dca = sample();
        let path = DataArrayPath::matrix("Image", "Cells");
        assert!(dca
            .get_prereq_attribute_matrix(&path, Some(AttributeMatrixType::Element))
            .is_ok());
        assert!(dca
            .get_prereq_attribute_matrix(&path, Some(AttributeMatrixType::Feature))
            .is_err());
    }

    #[test]
    fn test_create_non_prereq_array() {
        let mut dca = sample();
        let out = DataArrayPath::new("Image", "Cells", "Mask");
        let mask = dca.create_non_prereq_array::<bool>(&out, &[1], false).unwrap();
        assert!(!mask.is_allocated());
        assert_eq!(mask.number_of_tuples(), 4);
        assert!(matches!(
            dca.create_non_prereq_array::<bool>(&out, &[1], false),
            Err(DataError::NameCollision(_))
        ));
        let orphan = DataArrayPath::new("Image", "Missing", "Mask");
        assert_eq!(
            dca.create_non_prereq_array::<bool>(&orphan, &[1], true)
                .unwrap_err(),
            DataError::PathNotFound(orphan.matrix_path())
        );
    }

    #[test]
    fn test_renames_produce_events() {
        let mut dca = sample();
        let path = DataArrayPath::new("Image", "Cells", "FeatureIds");

        let rename = dca.rename_attribute_array(&path, "GrainIds").unwrap();
        assert_eq!(rename.new, path.with_array("GrainIds"));

        let rename = dca
            .rename_attribute_matrix(&DataArrayPath::matrix("Image", "Cells"), "Voxels")
            .unwrap();
        assert_eq!(rename.new, DataArrayPath::matrix("Image", "Voxels"));

        let rename = dca.rename_data_container("Image", "Volume").unwrap();
        assert_eq!(
            rename.apply(&DataArrayPath::new("Image", "Voxels", "GrainIds")),
            Some(DataArrayPath::new("Volume", "Voxels", "GrainIds"))
        );
        assert!(dca.does_attribute_array_exist(&DataArrayPath::new("Volume", "Voxels", "GrainIds")));

        dca.create_data_container("Other").unwrap();
        assert!(dca.rename_data_container("Volume", "Other").is_none());
        assert!(dca.rename_data_container("Missing", "X").is_none());
    }

    #[test]
    fn test_deep_copy_shape_only() {
        let dca = sample();
        let copy = dca.deep_copy(false).unwrap();
        let path = DataArrayPath::new("Image", "Cells", "FeatureIds");
        assert!(!copy.shape_view(&path).unwrap().is_allocated());
        assert!(dca.shape_view(&path).unwrap().is_allocated());
    }
}
