//! JSON pipeline description files.
//!
//! ```json
//! {
//!   "name": "Threshold phases",
//!   "filters": [
//!     { "filter": "CreateImageGeometry",
//!       "parameters": { "data_container": "Image", "dimensions": [10, 10, 4] } }
//!   ]
//! }
//! ```

use crate::pipeline::error::PipelineResult;
use crate::pipeline::executor::FilterPipeline;
use crate::pipeline::parameter::ParameterValue;
use crate::pipeline::registry::FilterRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Pipeline file format version
pub const PIPELINE_FILE_VERSION: u32 = 1;

/// One filter entry: class name plus parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub filter: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

fn default_version() -> u32 {
    PIPELINE_FILE_VERSION
}

impl Default for PipelineFile {
    fn default() -> Self {
        Self {
            version: PIPELINE_FILE_VERSION,
            name: String::new(),
            filters: Vec::new(),
        }
    }
}

impl PipelineFile {
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Snapshot the filters and parameter values of `pipeline`.
    pub fn from_pipeline(pipeline: &FilterPipeline) -> Self {
        let filters = pipeline
            .filters()
            .map(|filter| FilterEntry {
                filter: filter.name().to_string(),
                parameters: filter
                    .parameters()
                    .iter()
                    .filter_map(|info| {
                        filter
                            .parameter(info.name)
                            .map(|value| (info.name.to_string(), value))
                    })
                    .collect(),
            })
            .collect();
        Self {
            version: PIPELINE_FILE_VERSION,
            name: pipeline.name().to_string(),
            filters,
        }
    }

    /// Instantiate every filter through `registry` and apply its parameters.
    /// Parameters not listed keep the filter's defaults.
    pub fn build(&self, registry: &FilterRegistry) -> PipelineResult<FilterPipeline> {
        let mut pipeline = FilterPipeline::new();
        if !self.name.is_empty() {
            pipeline.set_name(self.name.clone());
        }
        for entry in &self.filters {
            let mut filter = registry.create(&entry.filter)?;
            for (name, value) in &entry.parameters {
                filter.set_parameter(name, value)?;
            }
            pipeline.push_back(filter);
        }
        tracing::info!(
            "Loaded pipeline '{}' with {} filters",
            pipeline.name(),
            pipeline.len()
        );
        Ok(pipeline)
    }
}
