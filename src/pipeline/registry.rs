//! Filter registry for creating filters by class name.
//!
//! Pipeline files name filters by class; the registry maps each name to a
//! factory producing a default-configured instance.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::filter::Filter;
use std::collections::BTreeMap;

/// Factory producing a default-configured filter.
pub type FilterFactory = fn() -> Box<dyn Filter>;

/// Metadata of a registered filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub name: &'static str,
    pub human_label: &'static str,
    pub group: &'static str,
    pub uuid: &'static str,
}

#[derive(Default)]
pub struct FilterRegistry {
    factories: BTreeMap<&'static str, (FilterDescriptor, FilterFactory)>,
}

impl FilterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in filter.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::filters::register_builtin(&mut registry);
        registry
    }

    /// Register `factory` under the class name of the filter it creates.
    /// A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, factory: FilterFactory) {
        let sample = factory();
        let descriptor = FilterDescriptor {
            name: sample.name(),
            human_label: sample.human_label(),
            group: sample.group(),
            uuid: sample.uuid(),
        };
        if self
            .factories
            .insert(descriptor.name, (descriptor.clone(), factory))
            .is_some()
        {
            tracing::warn!("Filter '{}' registered twice; keeping the last", descriptor.name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.factories.values().map(|(d, _)| d)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FilterDescriptor> {
        self.factories.get(name).map(|(d, _)| d)
    }

    /// Instantiate the filter registered as `name`.
    pub fn create(&self, name: &str) -> PipelineResult<Box<dyn Filter>> {
        self.factories
            .get(name)
            .map(|(_, factory)| factory())
            .ok_or_else(|| PipelineError::UnknownFilter(name.to_string()))
    }
}
