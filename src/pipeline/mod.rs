//! Filter pipeline.
//!
//! Filters run in order against one [`DataContainerArray`](crate::data::DataContainerArray)
//! owned by the run:
//!
//! ```text
//! preflight:  [CreateImageGeometry] ─► [ThresholdArray] ─► [RemoveFlaggedFeatures]
//!                 data_check             data_check            data_check     (shape only)
//! execute:    data_check + execute ─► ... ─► ...                               (allocating)
//! ```
//!
//! # Design
//!
//! - **Two-operation trait**: filters implement `data_check` and `execute`;
//!   lifecycle handling lives in provided methods.
//! - **Static parameter tables**: getter/setter pairs drive pipeline files
//!   and rename broadcasts.
//! - **Explicit run state**: no globals; each run owns its container array.
//! - **Observer channel**: messages go out over crossbeam when attached.

pub mod error;
pub mod executor;
pub mod file;
pub mod filter;
pub mod message;
pub mod parameter;
pub mod registry;

pub use error::{PipelineError, PipelineResult};
pub use executor::FilterPipeline;
pub use file::{FilterEntry, PipelineFile};
pub use filter::{Filter, FilterState, FilterStatus};
pub use message::{MessageKind, PipelineMessage};
pub use parameter::{ParameterDef, ParameterInfo, ParameterKind, ParameterValue};
pub use registry::{FilterDescriptor, FilterFactory, FilterRegistry};
