//! Geometry descriptors attached to data containers.
//!
//! The core never interprets geometry beyond element counts and grid
//! indexing; meshing and crystallographic meaning live elsewhere.

use serde::{Deserialize, Serialize};

/// Regular voxel grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeom {
    /// Voxel counts along x, y, z.
    pub dimensions: [usize; 3],
    pub spacing: [f32; 3],
    pub origin: [f32; 3],
}

impl ImageGeom {
    pub fn new(dimensions: [usize; 3]) -> Self {
        Self {
            dimensions,
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }

    pub fn with_spacing(mut self, spacing: [f32; 3]) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_origin(mut self, origin: [f32; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn number_of_elements(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Tuple dimensions for an element matrix on this grid (x fastest).
    pub fn tuple_dims(&self) -> Vec<usize> {
        self.dimensions.to_vec()
    }

    /// Flat voxel index, x varying fastest.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dimensions[1] + y) * self.dimensions[0] + x
    }

    /// Physical coordinates of a voxel center.
    pub fn coords(&self, x: usize, y: usize, z: usize) -> [f32; 3] {
        let ijk = [x, y, z];
        std::array::from_fn(|i| self.origin[i] + (ijk[i] as f32 + 0.5) * self.spacing[i])
    }
}

/// Unstructured point cloud.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexGeom {
    pub vertices: Vec<[f32; 3]>,
}

impl VertexGeom {
    pub fn number_of_elements(&self) -> usize {
        self.vertices.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Image(ImageGeom),
    Vertex(VertexGeom),
}

impl Geometry {
    pub fn number_of_elements(&self) -> usize {
        match self {
            Geometry::Image(g) => g.number_of_elements(),
            Geometry::Vertex(g) => g.number_of_elements(),
        }
    }

    pub fn as_image(&self) -> Option<&ImageGeom> {
        match self {
            Geometry::Image(g) => Some(g),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Image(_) => "ImageGeometry",
            Geometry::Vertex(_) => "VertexGeometry",
        }
    }
}
