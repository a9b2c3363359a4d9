//! # pdes-types::graph
//!
//! The pre-simulation configuration graph: components, the links that join
//! their ports, per-component parameters and partitioning state. A front
//! end (or generator) builds a `ConfigGraph`, a partitioner stamps ranks
//! onto it, and each rank's simulation wires itself up from the result.

use crate::{
    errors::ConfigError,
    ids::{ComponentId, LinkId, Rank, COMPONENT_UNSET, RANK_UNASSIGNED},
    params::Params,
    time::{SimTime, TimeLord},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

/// Configuration of one component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigComponent {
    pub id: ComponentId,
    pub name: String,
    pub type_name: String,
    /// Partitioning weight.
    pub weight: f64,
    /// Parallel rank, or `RANK_UNASSIGNED` until partitioning.
    pub rank: Rank,
    pub is_introspector: bool,
    pub params: Params,
    /// Links connected to this component, in binding order.
    pub links: Vec<LinkId>,
}

/// Configuration of one link between two component ports.
///
/// Endpoints fill in the order they are bound; a fully built link has
/// `current_ref == 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigLink {
    pub id: LinkId,
    pub name: String,
    pub comps: [ComponentId; 2],
    pub ports: [String; 2],
    /// Latency declared by each endpoint, in core cycles.
    pub latency: [SimTime; 2],
    pub current_ref: u8,
}

impl ConfigLink {
    fn new(id: LinkId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            comps: [COMPONENT_UNSET; 2],
            ports: [String::new(), String::new()],
            latency: [0; 2],
            current_ref: 0,
        }
    }

    /// The link's effective latency: the minimum declared by either side.
    pub fn min_latency(&self) -> SimTime {
        self.latency[0].min(self.latency[1])
    }
}

/// A graph of components and links, the unit of configuration exchanged
/// between front end, partitioner and simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigGraph {
    comps: BTreeMap<ComponentId, ConfigComponent>,
    links: BTreeMap<String, ConfigLink>,
    next_component_id: ComponentId,
    next_link_id: LinkId,
}

impl ConfigGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new component and returns its id.
    pub fn add_component(&mut self, name: &str, type_name: &str) -> ComponentId {
        self.add_component_with(name, type_name, 1.0, RANK_UNASSIGNED)
    }

    /// Creates a new component with an explicit weight and rank.
    pub fn add_component_with(
        &mut self,
        name: &str,
        type_name: &str,
        weight: f64,
        rank: Rank,
    ) -> ComponentId {
        let id = self.next_component_id;
        self.next_component_id += 1;
        self.comps.insert(
            id,
            ConfigComponent {
                id,
                name: name.to_string(),
                type_name: type_name.to_string(),
                weight,
                rank,
                is_introspector: false,
                params: Params::new(),
                links: Vec::new(),
            },
        );
        id
    }

    /// Creates a new introspector component.
    pub fn add_introspector(&mut self, name: &str, type_name: &str) -> ComponentId {
        let id = self.add_component(name, type_name);
        if let Some(comp) = self.comps.get_mut(&id) {
            comp.is_introspector = true;
        }
        id
    }

    pub fn set_component_rank(&mut self, id: ComponentId, rank: Rank) -> Result<(), ConfigError> {
        self.comp_mut(id)?.rank = rank;
        Ok(())
    }

    pub fn set_component_weight(&mut self, id: ComponentId, weight: f64) -> Result<(), ConfigError> {
        self.comp_mut(id)?.weight = weight;
        Ok(())
    }

    /// Merges a parameter set into a component, overwriting duplicates.
    pub fn add_params(&mut self, id: ComponentId, params: &Params) -> Result<(), ConfigError> {
        self.comp_mut(id)?.params.extend(params);
        Ok(())
    }

    pub fn add_parameter(
        &mut self,
        id: ComponentId,
        key: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), ConfigError> {
        self.comp_mut(id)?.params.insert(key, value, overwrite);
        Ok(())
    }

    /// Binds a port of `comp_id` to the link named `link_name`, creating
    /// the link on first mention. `latency_str` is parsed through the time
    /// lord; each endpoint declares its own latency.
    pub fn add_link(
        &mut self,
        lord: &mut TimeLord,
        comp_id: ComponentId,
        link_name: &str,
        port: &str,
        latency_str: &str,
    ) -> Result<LinkId, ConfigError> {
        if !self.comps.contains_key(&comp_id) {
            return Err(ConfigError::UnknownComponent(comp_id));
        }
        let latency = lord.get_time_converter(latency_str)?.factor();

        let next_id = &mut self.next_link_id;
        let link = self.links.entry(link_name.to_string()).or_insert_with(|| {
            let id = *next_id;
            *next_id += 1;
            ConfigLink::new(id, link_name)
        });
        if link.current_ref >= 2 {
            return Err(ConfigError::TooManyEndpoints(link_name.to_string()));
        }
        let slot = link.current_ref as usize;
        link.comps[slot] = comp_id;
        link.ports[slot] = port.to_string();
        link.latency[slot] = latency;
        link.current_ref += 1;
        let id = link.id;

        self.comps
            .get_mut(&comp_id)
            .expect("checked above")
            .links
            .push(id);
        Ok(id)
    }

    fn comp_mut(&mut self, id: ComponentId) -> Result<&mut ConfigComponent, ConfigError> {
        self.comps
            .get_mut(&id)
            .ok_or(ConfigError::UnknownComponent(id))
    }

    pub fn component(&self, id: ComponentId) -> Option<&ConfigComponent> {
        self.comps.get(&id)
    }

    /// Components in id order.
    pub fn components(&self) -> impl Iterator<Item = &ConfigComponent> {
        self.comps.values()
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut ConfigComponent> {
        self.comps.values_mut()
    }

    pub fn num_components(&self) -> usize {
        self.comps.len()
    }

    pub fn link_by_name(&self, name: &str) -> Option<&ConfigLink> {
        self.links.get(name)
    }

    /// Links sorted by id; the canonical walk order for wire-up.
    pub fn links_by_id(&self) -> Vec<&ConfigLink> {
        let mut links: Vec<&ConfigLink> = self.links.values().collect();
        links.sort_by_key(|l| l.id);
        links
    }

    /// Sets every component's rank to the same value.
    pub fn set_component_ranks(&mut self, rank: Rank) {
        for comp in self.comps.values_mut() {
            comp.rank = rank;
        }
    }

    /// Whether at least one component is assigned to `rank`.
    pub fn contains_component_in_rank(&self, rank: Rank) -> bool {
        self.comps.values().any(|c| c.rank == rank)
    }

    /// Verifies that every component has a rank in `[0, num_ranks)`.
    pub fn check_ranks(&self, num_ranks: Rank) -> bool {
        self.comps
            .values()
            .all(|c| c.rank >= 0 && c.rank < num_ranks)
    }

    /// Verifies the structural invariants of the graph: every link has
    /// exactly two endpoints with positive latencies, endpoints reference
    /// known components, a link never joins a component to itself, and no
    /// component binds the same port twice. Returns `true` when the graph
    /// is sound; every violation is logged.
    pub fn check_structure(&self) -> bool {
        let mut ok = true;
        for link in self.links.values() {
            if link.current_ref != 2 {
                tracing::error!(link = %link.name, endpoints = link.current_ref, "link is missing an endpoint");
                ok = false;
                continue;
            }
            for slot in 0..2 {
                if !self.comps.contains_key(&link.comps[slot]) {
                    tracing::error!(link = %link.name, comp = link.comps[slot], "link references an unknown component");
                    ok = false;
                }
                if link.latency[slot] == 0 {
                    tracing::error!(link = %link.name, port = %link.ports[slot], "link endpoint has zero latency");
                    ok = false;
                }
            }
            if link.comps[0] == link.comps[1] {
                tracing::error!(link = %link.name, "link joins a component to itself");
                ok = false;
            }
        }
        for comp in self.comps.values() {
            let mut seen = BTreeSet::new();
            for link in comp.links.iter().filter_map(|id| self.link_of(*id)) {
                for slot in 0..2 {
                    if link.comps[slot] == comp.id && !seen.insert(link.ports[slot].as_str()) {
                        tracing::error!(comp = %comp.name, port = %link.ports[slot], "port bound more than once");
                        ok = false;
                    }
                }
            }
        }
        ok
    }

    fn link_of(&self, id: LinkId) -> Option<&ConfigLink> {
        self.links.values().find(|l| l.id == id)
    }

    /// The smallest effective latency over links that cross ranks; the
    /// conservative lookahead of the partitioned graph.
    pub fn min_cross_rank_latency(&self) -> Option<SimTime> {
        self.links
            .values()
            .filter(|l| {
                l.current_ref == 2
                    && self.rank_of(l.comps[0]) != self.rank_of(l.comps[1])
            })
            .map(ConfigLink::min_latency)
            .min()
    }

    fn rank_of(&self, id: ComponentId) -> Rank {
        self.comps.get(&id).map(|c| c.rank).unwrap_or(RANK_UNASSIGNED)
    }

    /// Writes the graph to `path`, either as a dot graph or as a readable
    /// listing.
    pub fn dump_to_file(&self, path: &Path, as_dot: bool) -> Result<(), ConfigError> {
        let mut file = std::fs::File::create(path)?;
        if as_dot {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("config");
            self.gen_dot(&mut file, name)?;
        } else {
            self.gen_text(&mut file)?;
        }
        Ok(())
    }

    /// Emits the graph in dot format: components are nodes, each link one
    /// undirected edge labeled with the link name.
    pub fn gen_dot(&self, w: &mut dyn Write, name: &str) -> std::io::Result<()> {
        writeln!(w, "graph \"{name}\" {{")?;
        for comp in self.comps.values() {
            writeln!(w, "    \"{}\";", comp.name)?;
        }
        for link in self.links_by_id() {
            let a = self.comp_name(link.comps[0]);
            let b = self.comp_name(link.comps[1]);
            writeln!(
                w,
                "    \"{a}\":\"{}\" -- \"{b}\":\"{}\" [label=\"{}\"];",
                link.ports[0], link.ports[1], link.name
            )?;
        }
        writeln!(w, "}}")
    }

    fn gen_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for comp in self.comps.values() {
            writeln!(
                w,
                "component {} (id={}, type={}, weight={}, rank={}, links={})",
                comp.name,
                comp.id,
                comp.type_name,
                comp.weight,
                comp.rank,
                comp.links.len()
            )?;
        }
        for link in self.links_by_id() {
            writeln!(
                w,
                "link {} (id={}): {}:{} ({} cycles) -- {}:{} ({} cycles)",
                link.name,
                link.id,
                self.comp_name(link.comps[0]),
                link.ports[0],
                link.latency[0],
                self.comp_name(link.comps[1]),
                link.ports[1],
                link.latency[1]
            )?;
        }
        Ok(())
    }

    fn comp_name(&self, id: ComponentId) -> &str {
        self.comps.get(&id).map(|c| c.name.as_str()).unwrap_or("?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_comp_graph() -> (ConfigGraph, TimeLord) {
        let mut lord = TimeLord::new("1 ps").unwrap();
        let mut g = ConfigGraph::new();
        let a = g.add_component("a", "src");
        let b = g.add_component("b", "sink");
        g.add_link(&mut lord, a, "wire", "out", "10 ns").unwrap();
        g.add_link(&mut lord, b, "wire", "in", "10 ns").unwrap();
        (g, lord)
    }

    #[test]
    fn ids_are_monotonic() {
        let mut g = ConfigGraph::new();
        let a = g.add_component("a", "t");
        let b = g.add_component("b", "t");
        assert!(b > a);
    }

    #[test]
    fn link_endpoints_fill_in_order() {
        let (g, _) = two_comp_graph();
        let link = g.link_by_name("wire").unwrap();
        assert_eq!(link.current_ref, 2);
        assert_eq!(link.ports, ["out".to_string(), "in".to_string()]);
        assert_eq!(link.latency, [10_000, 10_000]);
        assert_eq!(link.min_latency(), 10_000);
    }

    #[test]
    fn third_endpoint_is_rejected() {
        let (mut g, mut lord) = two_comp_graph();
        let c = g.add_component("c", "extra");
        let err = g.add_link(&mut lord, c, "wire", "in", "1 ns");
        assert!(matches!(err, Err(ConfigError::TooManyEndpoints(_))));
    }

    #[test]
    fn structural_check_passes_a_sound_graph() {
        let (g, _) = two_comp_graph();
        assert!(g.check_structure());
    }

    #[test]
    fn structural_check_flags_a_dangling_link() {
        let mut lord = TimeLord::new("1 ps").unwrap();
        let mut g = ConfigGraph::new();
        let a = g.add_component("a", "src");
        g.add_link(&mut lord, a, "wire", "out", "10 ns").unwrap();
        assert!(!g.check_structure());
    }

    #[test]
    fn structural_check_flags_a_self_loop() {
        let mut lord = TimeLord::new("1 ps").unwrap();
        let mut g = ConfigGraph::new();
        let a = g.add_component("a", "src");
        g.add_link(&mut lord, a, "loop", "out", "1 ns").unwrap();
        g.add_link(&mut lord, a, "loop", "in", "1 ns").unwrap();
        assert!(!g.check_structure());
    }

    #[test]
    fn structural_check_flags_duplicate_port_bindings() {
        let mut lord = TimeLord::new("1 ps").unwrap();
        let mut g = ConfigGraph::new();
        let a = g.add_component("a", "src");
        let b = g.add_component("b", "sink");
        let c = g.add_component("c", "sink");
        g.add_link(&mut lord, a, "w0", "out", "1 ns").unwrap();
        g.add_link(&mut lord, b, "w0", "in", "1 ns").unwrap();
        g.add_link(&mut lord, a, "w1", "out", "1 ns").unwrap();
        g.add_link(&mut lord, c, "w1", "in", "1 ns").unwrap();
        assert!(!g.check_structure());
    }

    #[test]
    fn rank_checks() {
        let (mut g, _) = two_comp_graph();
        assert!(!g.check_ranks(2));
        g.set_component_ranks(0);
        assert!(g.check_ranks(2));
        assert!(g.contains_component_in_rank(0));
        assert!(!g.contains_component_in_rank(1));
    }

    #[test]
    fn cross_rank_latency_is_the_minimum() {
        let (mut g, mut lord) = two_comp_graph();
        g.set_component_rank(0, 0).unwrap();
        g.set_component_rank(1, 1).unwrap();
        let a = g.add_component("c", "src");
        let b = g.add_component("d", "sink");
        g.set_component_rank(a, 0).unwrap();
        g.set_component_rank(b, 1).unwrap();
        g.add_link(&mut lord, a, "fast", "out", "2 ns").unwrap();
        g.add_link(&mut lord, b, "fast", "in", "3 ns").unwrap();
        assert_eq!(g.min_cross_rank_latency(), Some(2_000));
    }

    #[test]
    fn dot_output_lists_ports_and_label() {
        let (g, _) = two_comp_graph();
        let mut buf = Vec::new();
        g.gen_dot(&mut buf, "test").unwrap();
        let dot = String::from_utf8(buf).unwrap();
        assert!(dot.contains("\"a\":\"out\" -- \"b\":\"in\" [label=\"wire\"];"));
    }
}
