//! Test data builders for creating container arrays

use voxelpipe::data::{
    ArrayElement, AttributeMatrixType, DataArray, DataContainerArray, Geometry, ImageGeom,
};

/// Builder for an `Image` container with one `Cells` element matrix on an
/// `[nx, ny, nz]` grid, plus an optional `Features` matrix.
pub struct ImageBuilder {
    dims: [usize; 3],
    cell_arrays: Vec<Box<dyn FnOnce(&mut DataContainerArray)>>,
    features: Option<usize>,
}

impl ImageBuilder {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            cell_arrays: Vec::new(),
            features: None,
        }
    }

    /// Add a single-component cell array.
    pub fn cell_array<T: ArrayElement>(mut self, name: &str, values: Vec<T>) -> Self {
        let name = name.to_string();
        self.cell_arrays.push(Box::new(move |dca| {
            dca.data_container_mut("Image")
                .and_then(|dc| dc.attribute_matrix_mut("Cells"))
                .unwrap()
                .add_attribute_array(DataArray::from_vec(name, values))
                .unwrap();
        }));
        self
    }

    pub fn features(mut self, count: usize) -> Self {
        self.features = Some(count);
        self
    }

    pub fn build(self) -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        let dc = dca.create_data_container("Image").unwrap();
        dc.set_geometry(Geometry::Image(ImageGeom::new(self.dims)));
        dc.create_attribute_matrix(&self.dims, "Cells", AttributeMatrixType::Element)
            .unwrap();
        if let Some(count) = self.features {
            dc.create_attribute_matrix(&[count], "Features", AttributeMatrixType::Feature)
                .unwrap();
        }
        for add in self.cell_arrays {
            add(&mut dca);
        }
        dca
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelpipe::DataArrayPath;

    #[test]
    fn test_image_builder() {
        let dca = ImageBuilder::new([2, 2, 1])
            .cell_array("Phases", vec![1i32, 1, 2, 2])
            .features(3)
            .build();

        let cells = dca
            .attribute_matrix(&DataArrayPath::matrix("Image", "Cells"))
            .unwrap();
        assert_eq!(cells.number_of_tuples(), 4);
        assert!(cells.contains("Phases"));
        assert!(dca.does_attribute_matrix_exist(&DataArrayPath::matrix("Image", "Features")));
    }
}
