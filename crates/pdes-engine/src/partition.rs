//! # pdes-engine::partition
//!
//! Partitioners stamp a rank onto every component of a configuration
//! graph. All of them are deterministic functions of the graph: a graph
//! partitioned twice with the same strategy lands identically.

use crate::factory::Factory;
use crate::prelude::*;
use pdes_types::{errors::ConfigError, graph::ConfigGraph};

/// Assigns contiguous blocks of `ceil(n / num_ranks)` components, in id
/// order.
pub fn simple_partition(graph: &mut ConfigGraph, num_ranks: Rank) {
    let count = graph.num_components();
    let block = count.div_ceil(num_ranks as usize).max(1);
    for (index, comp) in graph.components_mut().enumerate() {
        comp.rank = (index / block) as Rank;
    }
}

/// Assigns component `id` to rank `id % num_ranks`.
pub fn rrobin_partition(graph: &mut ConfigGraph, num_ranks: Rank) {
    for comp in graph.components_mut() {
        comp.rank = (comp.id % num_ranks as u64) as Rank;
    }
}

/// Walks components in id order, filling each rank until its accumulated
/// weight reaches `total_weight / num_ranks`; keeps neighbors with close
/// ids on the same rank while balancing weighted load.
pub fn linear_partition(graph: &mut ConfigGraph, num_ranks: Rank) {
    let total: f64 = graph.components().map(|c| c.weight).sum();
    let target = total / num_ranks as f64;
    let mut rank: Rank = 0;
    let mut accumulated = 0.0;
    for comp in graph.components_mut() {
        comp.rank = rank;
        accumulated += comp.weight;
        if accumulated >= target && rank < num_ranks - 1 {
            rank += 1;
            accumulated = 0.0;
        }
    }
}

/// Runs the named partitioning strategy over the graph and verifies the
/// result. `self` leaves the model's own rank assignments in place; any
/// other name first resets all ranks so stale assignments are caught by
/// the rank check. Unknown names are looked up in the factory registry.
pub fn run_partitioner(
    graph: &mut ConfigGraph,
    factory: &Factory,
    method: &str,
    num_ranks: Rank,
) -> Result<(), ConfigError> {
    match method {
        "self" => {}
        _ => {
            graph.set_component_ranks(RANK_UNASSIGNED);
            match method {
                "simple" => simple_partition(graph, num_ranks),
                "rrobin" | "roundrobin" => rrobin_partition(graph, num_ranks),
                "linear" => linear_partition(graph, num_ranks),
                name => factory.partitioner(name)?(graph, num_ranks),
            }
        }
    }
    if !graph.check_ranks(num_ranks) {
        return Err(ConfigError::BadRanks { num_ranks });
    }
    Ok(())
}
