//! # pdes-types::ids
//!
//! Defines the core identifier types used throughout the simulation.
//! Using distinct aliases for different kinds of IDs helps prevent bugs
//! where, for example, a `ComponentId` might be accidentally used as a
//! `LinkId`.

/// A unique identifier for a component, assigned monotonically during
/// graph construction.
/// Invariant: ids are process-globally unique within one run.
pub type ComponentId = u64;

/// A unique identifier for a link between two component ports.
pub type LinkId = u64;

/// An opaque identifier a component chooses for one of its own handlers
/// (clock handlers, link functors, introspection hooks). The engine hands
/// it back verbatim on every invocation.
pub type HandlerId = u64;

/// The parallel rank a component is assigned to. `RANK_UNASSIGNED` marks
/// a component whose rank has not been decided yet (self-partitioning
/// pending).
pub type Rank = i32;

/// Sentinel rank for components not yet assigned by a partitioner.
pub const RANK_UNASSIGNED: Rank = -1;

/// Sentinel for an unfilled link endpoint.
pub const COMPONENT_UNSET: ComponentId = ComponentId::MAX;
