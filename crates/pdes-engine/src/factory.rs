//! # pdes-engine::factory
//!
//! The registry that maps configuration-graph type names onto component
//! constructors, plus the registries for pluggable partitioners and graph
//! generators. Component libraries register themselves here before
//! wire-up; an unknown name is fatal before the main loop starts.

use crate::component::Component;
use crate::prelude::*;
use fxhash::FxHashMap;
use pdes_types::{errors::ConfigError, graph::ConfigGraph, params::Params};

/// Builds one component instance from its configured parameters.
pub type ComponentCtor = Box<dyn Fn(&Params) -> Box<dyn Component> + Send + Sync>;

/// A pluggable partitioning function; mutates the rank of every component.
pub type PartitionFn = fn(&mut ConfigGraph, Rank);

/// A programmatic graph builder, driven by an option string.
pub type GeneratorFn = fn(&mut ConfigGraph, &str, Rank) -> Result<(), ConfigError>;

/// Name-keyed registries for components, partitioners and generators.
#[derive(Default)]
pub struct Factory {
    components: FxHashMap<String, ComponentCtor>,
    partitioners: FxHashMap<String, PartitionFn>,
    generators: FxHashMap<String, GeneratorFn>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component(
        &mut self,
        name: &str,
        ctor: impl Fn(&Params) -> Box<dyn Component> + Send + Sync + 'static,
    ) -> &mut Self {
        self.components.insert(name.to_string(), Box::new(ctor));
        self
    }

    pub fn register_partitioner(&mut self, name: &str, f: PartitionFn) -> &mut Self {
        self.partitioners.insert(name.to_string(), f);
        self
    }

    pub fn register_generator(&mut self, name: &str, f: GeneratorFn) -> &mut Self {
        self.generators.insert(name.to_string(), f);
        self
    }

    pub fn create_component(
        &self,
        type_name: &str,
        params: &Params,
    ) -> Result<Box<dyn Component>, SimError> {
        let ctor = self.components.get(type_name).ok_or_else(|| SimError::Factory {
            kind: "component",
            name: type_name.to_string(),
        })?;
        Ok(ctor(params))
    }

    pub fn partitioner(&self, name: &str) -> Result<PartitionFn, SimError> {
        self.partitioners
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Factory {
                kind: "partitioner",
                name: name.to_string(),
            })
    }

    pub fn generator(&self, name: &str) -> Result<GeneratorFn, SimError> {
        self.generators
            .get(name)
            .copied()
            .ok_or_else(|| SimError::Factory {
                kind: "generator",
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_are_factory_errors() {
        let factory = Factory::new();
        assert!(matches!(
            factory.create_component("nope", &Params::new()),
            Err(SimError::Factory { kind: "component", .. })
        ));
        assert!(factory.partitioner("nope").is_err());
        assert!(factory.generator("nope").is_err());
    }
}
