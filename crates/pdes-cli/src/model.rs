//! # pdes-cli::model
//!
//! The TOML model reader: the stand-in front end that turns a component
//! and link listing into a configuration graph. Richer front ends (XML,
//! scripted models) plug in upstream of this and produce the same graph.

use anyhow::{Context, Result};
use pdes_types::{
    errors::ConfigError,
    graph::ConfigGraph,
    ids::{Rank, RANK_UNASSIGNED},
    time::TimeLord,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub config: ModelConfig,
    #[serde(default, rename = "component")]
    pub components: Vec<ModelComponent>,
}

/// Settings a model may carry; explicit command-line flags take
/// precedence.
#[derive(Debug, Default, Deserialize)]
pub struct ModelConfig {
    pub stop_at: Option<String>,
    pub partitioner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_rank")]
    pub rank: Rank,
    #[serde(default)]
    pub introspector: bool,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, rename = "link")]
    pub links: Vec<ModelLink>,
}

#[derive(Debug, Deserialize)]
pub struct ModelLink {
    pub name: String,
    pub port: String,
    pub latency: String,
}

fn default_weight() -> f64 {
    1.0
}

fn default_rank() -> Rank {
    RANK_UNASSIGNED
}

pub fn load(path: &Path) -> Result<ModelFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read model file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Builds the configuration graph described by a model file.
pub fn build_graph(model: &ModelFile, lord: &mut TimeLord) -> Result<ConfigGraph, ConfigError> {
    let mut graph = ConfigGraph::new();
    for comp in &model.components {
        let id = if comp.introspector {
            graph.add_introspector(&comp.name, &comp.type_name)
        } else {
            graph.add_component_with(&comp.name, &comp.type_name, comp.weight, comp.rank)
        };
        for (key, value) in &comp.params {
            graph.add_parameter(id, key, value, true)?;
        }
        for link in &comp.links {
            graph.add_link(lord, id, &link.name, &link.port, &link.latency)?;
        }
    }
    Ok(graph)
}
