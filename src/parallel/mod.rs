//! Range-partitioned parallel execution for per-voxel inner loops.
//!
//! ```text
//! ParallelDataAlgorithm<R>
//!     ├── range.split(grain) ─► [R0, R1, R2, ...]   disjoint, full cover
//!     ├── parallel   ─► rayon par_iter over partitions (global or dedicated pool)
//!     └── sequential ─► f(range) once
//! ```
//!
//! Workers write into pre-allocated outputs through
//! [`ParallelDataAlgorithm::execute_chunks`] (1D) or a [`BlockWriter`]
//! (2D/3D). Every call joins before returning.

pub mod algorithm;
pub mod pool;
pub mod range;
pub mod task;

pub use algorithm::{BlockWriter, ParallelData2DAlgorithm, ParallelData3DAlgorithm, ParallelDataAlgorithm};
pub use pool::ParallelContext;
pub use range::{Partition, Range2D, Range3D};
pub use task::ParallelTaskAlgorithm;
