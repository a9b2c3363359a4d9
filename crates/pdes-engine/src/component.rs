//! # pdes-engine::component
//!
//! The user-facing component model. Model code implements the [`Component`]
//! trait; the engine keeps the bookkeeping half (name, type, default time
//! base, the port-to-link map) in a [`CompMeta`] it owns. Every callback
//! receives a [`Ctx`](crate::sim::Ctx) through which the component talks
//! back to the kernel: registering clocks, configuring and sending on
//! links, querying time, and voting on termination.

use crate::prelude::*;
use bytes::Bytes;
use indexmap::IndexMap;

/// Behavior of one simulated component.
///
/// Handlers run to completion before the next activity is popped and must
/// not block. Errors propagate out of the dispatch loop and terminate the
/// rank.
pub trait Component: Send {
    /// Called once during wire-up, after every link of the configuration
    /// graph has been bound to its port name. This is where the component
    /// registers clocks, configures its links and self-links, and
    /// registers with the exit coordinator.
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError>;

    /// An event arrived on a functor link. `payload` is `None` for null
    /// ticks, which carry no data and only advance time.
    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        handler: HandlerId,
        payload: Option<Bytes>,
    ) -> Result<(), SimError>;

    /// A clock this component registered on has ticked. `cycle` counts
    /// ticks of that clock. Return `true` to unregister this handler.
    fn on_clock(
        &mut self,
        _ctx: &mut Ctx,
        _handler: HandlerId,
        _cycle: u64,
    ) -> Result<bool, SimError> {
        Ok(true)
    }

    /// A periodic introspection hook registered by this component fired.
    fn on_introspect(&mut self, _ctx: &mut Ctx, _handler: HandlerId) -> Result<(), SimError> {
        Ok(())
    }

    /// Called once when the simulation ends, in component id order.
    fn finish(&mut self, _ctx: &mut Ctx) -> Result<(), SimError> {
        Ok(())
    }
}

/// Engine-side bookkeeping for one instantiated component.
#[derive(Debug)]
pub struct CompMeta {
    pub id: ComponentId,
    pub name: String,
    pub type_name: String,
    pub default_time_base: Option<TimeConverter>,
    /// Port name to link half, in binding order.
    pub links: IndexMap<String, LinkId>,
}

impl CompMeta {
    pub fn new(id: ComponentId, name: &str, type_name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            default_time_base: None,
            links: IndexMap::new(),
        }
    }
}
