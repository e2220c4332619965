//! Typed array data model.
//!
//! ```text
//! DataContainerArray
//! └── DataContainer "Image"      (geometry: 3D grid)
//!     ├── AttributeMatrix "Cells"     tuple dims [nx, ny, nz]
//!     │   ├── DataArray<i32> "FeatureIds"   1 component
//!     │   └── DataArray<f32> "Eulers"       3 components
//!     └── AttributeMatrix "Features"  tuple dims [n_features]
//! ```
//!
//! - **Explicit ownership**: containers own matrices, matrices own arrays.
//! - **Path lookups**: every level is addressed through a `DataArrayPath`.
//! - **Shape-only arrays**: preflight creates arrays without storage.

pub mod array;
pub mod attribute_matrix;
pub mod container;
pub mod error;
pub mod geometry;
pub mod path;

pub use array::{AnyArray, ArrayElement, ArrayInfo, DataArray, ElementType, NumericElement, ShapeView};
pub use attribute_matrix::{AttributeMatrix, AttributeMatrixType};
pub use container::{DataContainer, DataContainerArray};
pub use error::{DataError, DataResult};
pub use geometry::{Geometry, ImageGeom, VertexGeom};
pub use path::{DataArrayPath, PathRename};
