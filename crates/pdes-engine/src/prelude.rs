//! # pdes-engine::prelude
//!
//! A convenience module that re-exports the most commonly used types from
//! the engine and its foundation crate. This simplifies imports for model
//! code and for the CLI.

pub use crate::{
    activity::{priority, Action, Activity, ClockId, Event, NullEvent},
    clock::{Clock, ClockHandle},
    component::{CompMeta, Component},
    exit::Exit,
    factory::Factory,
    link::{Delivery, Link, Target},
    sim::{Ctx, Simulation},
    sync::{Fabric, LoopbackFabric, SingleRank, WireEvent},
    vortex::TimeVortex,
};

pub use pdes_types::{
    self,
    errors::{ConfigError, SimError},
    graph::{ConfigComponent, ConfigGraph, ConfigLink},
    ids::{ComponentId, HandlerId, LinkId, Rank, COMPONENT_UNSET, RANK_UNASSIGNED},
    params::Params,
    time::{checked_add, SimTime, TimeConverter, TimeLord, MAX_SIM_TIME, SIM_EPOCH},
};
