//! # voxelpipe: filter pipelines over voxel data
//!
//! A typed-array data model for voxel-based microstructure data, a filter
//! pipeline that validates (preflights) and then executes a chain of filters
//! against it, and range-partitioned parallel algorithms for the per-voxel
//! inner loops.
//!
//! ## Architecture
//!
//! - **Data**: containers own attribute matrices, matrices own typed arrays
//! - **Pipeline**: ordered filters with a preflight/execute state machine
//! - **Parallel**: rayon-backed range partitioning with a sequential fallback
//! - **Filters**: built-in filters registered by class name
//! - **Communication**: Crossbeam channels carry filter messages to observers
//!
//! ## Configuration
//!
//! Settings (parallelism, pipeline, logging) are stored as TOML in the
//! platform config directory under `voxelpipe/voxelpipe.toml`. See
//! [`config`] for the environment overrides.
//!
//! ## Example
//!
//! ```ignore
//! use voxelpipe::{
//!     config::VoxelPipeConfig,
//!     pipeline::{FilterRegistry, PipelineFile},
//! };
//!
//! fn main() -> voxelpipe::Result<()> {
//!     let config = VoxelPipeConfig::load_or_default();
//!     let registry = FilterRegistry::with_builtin();
//!
//!     let mut pipeline = PipelineFile::load("segment.json")?.build(&registry)?;
//!     pipeline.set_parallel_settings(&config.parallel);
//!     let dca = pipeline.run()?;
//!
//!     for name in dca.data_container_names() {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod filters;
pub mod parallel;
pub mod pipeline;

// Re-export commonly used types
pub use config::VoxelPipeConfig;
pub use data::{DataArray, DataArrayPath, DataContainerArray, DataError};
pub use error::{Result, ResultExt, VoxelPipeError};
pub use parallel::{ParallelContext, ParallelDataAlgorithm};
pub use pipeline::{Filter, FilterPipeline, FilterRegistry, PipelineError, PipelineFile};
