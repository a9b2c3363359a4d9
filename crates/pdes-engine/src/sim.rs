//! # pdes-engine::sim
//!
//! The `Simulation` driver: it owns the time vortex, the link table, the
//! clock registry, the exit coordinator and every local component, wires
//! itself up from a partitioned configuration graph, and runs the
//! dispatch loop. Components talk back to the kernel through the [`Ctx`]
//! handle passed into every callback; the kernel never exposes a global
//! accessor.

use crate::{
    activity::{Action, Activity, ClockId},
    clock::{Clock, ClockHandle},
    component::{CompMeta, Component},
    exit::Exit,
    factory::Factory,
    link::{endpoint_link_id, Delivery, Link, Target, SELF_LINK_BASE},
    prelude::*,
    sync::{Fabric, WireEvent},
    vortex::TimeVortex,
};
use bytes::Bytes;
use fxhash::FxHashMap;
use pdes_types::graph::ConfigGraph;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Default period of the exit coordinator's check, used when the core
/// base cannot represent 100 ns.
const EXIT_PERIOD_FALLBACK: SimTime = 100;

struct CompSlot {
    meta: CompMeta,
    /// Taken out of the slot for the duration of a callback so the
    /// component and the kernel can both be borrowed mutably.
    imp: Option<Box<dyn Component>>,
}

/// One local send half whose opposite end lives on a peer rank.
struct CrossSend {
    peer: Rank,
    /// The receiving half's id on the peer.
    dest: LinkId,
    latency: SimTime,
}

/// Conservative synchronization state of a multi-rank run.
struct SyncState {
    /// Minimum effective latency over cross-rank links.
    lookahead: SimTime,
    /// Exclusive upper bound of the current dispatch window.
    window_end: SimTime,
    outboxes: BTreeMap<Rank, Vec<WireEvent>>,
    cross_sends: Vec<CrossSend>,
    /// Destinations that saw traffic in the current window; the rest get
    /// a null tick at the boundary.
    sent: BTreeSet<LinkId>,
}

/// The per-rank simulation instance.
pub struct Simulation {
    lord: TimeLord,
    vortex: TimeVortex,
    links: FxHashMap<LinkId, Link>,
    comps: BTreeMap<ComponentId, CompSlot>,
    clocks: Vec<Clock>,
    clock_by_factor: FxHashMap<u64, ClockId>,
    exit: Exit,
    fabric: Box<dyn Fabric>,
    sync: Option<SyncState>,
    current_cycle: SimTime,
    stop_flag: bool,
    dispatched: u64,
    next_self_link_id: LinkId,
    status_signal: Option<Arc<AtomicBool>>,
    stop_signal: Option<Arc<AtomicBool>>,
}

impl Simulation {
    /// Instantiates this rank's slice of a partitioned graph and runs
    /// every local component's `setup`. The graph must already have
    /// passed `check_structure` and `check_ranks`.
    pub fn build(
        graph: &ConfigGraph,
        factory: &Factory,
        mut lord: TimeLord,
        fabric: Box<dyn Fabric>,
    ) -> Result<Self, SimError> {
        let rank = fabric.rank();
        let num_ranks = fabric.num_ranks();
        let exit_period = lord
            .get_time_converter("100 ns")
            .map(|tc| tc.factor())
            .unwrap_or(EXIT_PERIOD_FALLBACK);

        let mut links = FxHashMap::default();
        let mut port_maps: BTreeMap<ComponentId, Vec<(String, LinkId)>> = BTreeMap::new();
        let mut cross_sends = Vec::new();

        for link in graph.links_by_id() {
            for slot in 0..2 {
                let comp_id = link.comps[slot];
                let comp_rank = graph
                    .component(comp_id)
                    .map(|c| c.rank)
                    .ok_or(SimError::ComponentNotFound(comp_id))?;
                if comp_rank != rank {
                    continue;
                }
                let other = 1 - slot;
                let other_rank = graph
                    .component(link.comps[other])
                    .map(|c| c.rank)
                    .ok_or(SimError::ComponentNotFound(link.comps[other]))?;
                let id = endpoint_link_id(link.id, slot);
                let dest = endpoint_link_id(link.id, other);
                let target = if other_rank == rank {
                    Target::Local { dest }
                } else {
                    cross_sends.push(CrossSend {
                        peer: other_rank,
                        dest,
                        latency: link.min_latency(),
                    });
                    Target::Remote {
                        rank: other_rank,
                        dest,
                    }
                };
                links.insert(id, Link::new(id, comp_id, link.min_latency(), target));
                port_maps
                    .entry(comp_id)
                    .or_default()
                    .push((link.ports[slot].clone(), id));
            }
        }

        let mut comps = BTreeMap::new();
        for cfg in graph.components().filter(|c| c.rank == rank) {
            let imp = factory.create_component(&cfg.type_name, &cfg.params)?;
            let mut meta = CompMeta::new(cfg.id, &cfg.name, &cfg.type_name);
            for (port, id) in port_maps.remove(&cfg.id).unwrap_or_default() {
                meta.links.insert(port, id);
            }
            tracing::debug!(comp = %meta.name, id = meta.id, ty = %meta.type_name, "instantiated component");
            comps.insert(cfg.id, CompSlot { meta, imp: Some(imp) });
        }

        let sync = (num_ranks > 1).then(|| {
            let lookahead = graph.min_cross_rank_latency().unwrap_or(MAX_SIM_TIME);
            SyncState {
                lookahead,
                window_end: lookahead,
                outboxes: BTreeMap::new(),
                cross_sends,
                sent: BTreeSet::new(),
            }
        });

        let mut sim = Self {
            lord,
            vortex: TimeVortex::new(),
            links,
            comps,
            clocks: Vec::new(),
            clock_by_factor: FxHashMap::default(),
            exit: Exit::new(exit_period),
            fabric,
            sync,
            current_cycle: SIM_EPOCH,
            stop_flag: false,
            dispatched: 0,
            next_self_link_id: SELF_LINK_BASE,
            status_signal: None,
            stop_signal: None,
        };

        let ids: Vec<ComponentId> = sim.comps.keys().copied().collect();
        for id in ids {
            sim.with_component(id, |comp, ctx| comp.setup(ctx))??;
        }
        Ok(sim)
    }

    pub fn rank(&self) -> Rank {
        self.fabric.rank()
    }

    pub fn num_ranks(&self) -> Rank {
        self.fabric.num_ranks()
    }

    pub fn now(&self) -> SimTime {
        self.current_cycle
    }

    /// Number of activities dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Attaches the signal flags checked at every pop: `status` prints a
    /// one-line progress report, `stop` requests a clean drain.
    pub fn set_signal_flags(&mut self, status: Arc<AtomicBool>, stop: Arc<AtomicBool>) {
        self.status_signal = Some(status);
        self.stop_signal = Some(stop);
    }

    /// Pre-schedules a stop action. `spec` is a time string; returns the
    /// stop cycle.
    pub fn set_stop_at(&mut self, spec: &str, message: Option<String>) -> Result<SimTime, SimError> {
        let at = self.lord.get_time_converter(spec)?.factor();
        self.vortex.insert(Activity::stop(at, message));
        Ok(at)
    }

    /// Sets the sticky stop flag; the loop drains at the next pop.
    pub fn end_simulation(&mut self) {
        self.stop_flag = true;
    }

    /// Runs the dispatch loop until termination and returns the elapsed
    /// simulated time in core cycles.
    pub fn run(&mut self) -> Result<SimTime, SimError> {
        tracing::info!(rank = self.rank(), "entering the simulation loop");
        loop {
            self.check_signals();
            if self.stop_flag {
                if self.num_ranks() == 1 {
                    break;
                }
                // A rank never leaves the collective group on its own;
                // the stop vote at the next boundary releases everyone.
                if self.synchronize(true)? {
                    break;
                }
                continue;
            }
            if self.vortex.is_drained() {
                if self.num_ranks() == 1 {
                    break;
                }
                if self.synchronize(true)? {
                    break;
                }
                continue;
            }
            let next = self
                .vortex
                .front()
                .map(|a| a.delivery_time)
                .expect("vortex is not drained");
            if let Some(window_end) = self.sync.as_ref().map(|s| s.window_end) {
                if next >= window_end {
                    if self.synchronize(false)? {
                        break;
                    }
                    continue;
                }
            }
            let activity = self.vortex.pop().expect("front was present");
            debug_assert!(
                activity.delivery_time >= self.current_cycle,
                "time went backwards"
            );
            self.current_cycle = activity.delivery_time;
            self.dispatched += 1;
            self.dispatch(activity)?;
        }
        self.shutdown()?;
        tracing::info!(
            rank = self.rank(),
            cycles = self.current_cycle,
            dispatched = self.dispatched,
            "simulation complete"
        );
        Ok(self.current_cycle)
    }

    fn check_signals(&mut self) {
        if let Some(flag) = &self.status_signal {
            if flag.swap(false, Ordering::Relaxed) {
                tracing::info!(
                    target: "events",
                    rank = self.rank(),
                    cycle = self.current_cycle,
                    queued = self.vortex.len(),
                    dispatched = self.dispatched,
                    "status requested"
                );
            }
        }
        if let Some(flag) = &self.stop_signal {
            if flag.load(Ordering::Relaxed) && !self.stop_flag {
                tracing::info!(rank = self.rank(), "stop signal received, draining");
                self.end_simulation();
            }
        }
    }

    fn dispatch(&mut self, activity: Activity) -> Result<(), SimError> {
        match activity.action {
            Action::Event(ev) => self.deliver(ev.link_id, Some(ev.payload)),
            Action::Null(ne) => self.deliver(ne.link_id, None),
            Action::Clock { clock } => self.fire_clock(clock),
            Action::CheckExit => {
                self.exit.scheduled = false;
                if self.exit.ref_count() == 0 {
                    tracing::info!(
                        target: "events",
                        cycle = self.current_cycle,
                        "exit coordinator reached zero references"
                    );
                    self.end_simulation();
                } else {
                    let at = self.current_cycle.saturating_add(self.exit.period);
                    self.vortex.insert(Activity::check_exit(at));
                    self.exit.scheduled = true;
                }
                Ok(())
            }
            Action::Stop { message } => {
                if let Some(msg) = message {
                    println!("{msg}");
                }
                tracing::info!(target: "events", cycle = self.current_cycle, "stop action fired");
                self.end_simulation();
                Ok(())
            }
            Action::Introspect {
                comp,
                handler,
                period,
            } => {
                self.with_component(comp, |c, ctx| c.on_introspect(ctx, handler))??;
                let at = self.current_cycle.saturating_add(period);
                self.vortex.insert(Activity::introspect(at, comp, handler, period));
                Ok(())
            }
        }
    }

    fn deliver(&mut self, link_id: LinkId, payload: Option<Bytes>) -> Result<(), SimError> {
        enum Route {
            Handler(ComponentId, HandlerId),
            Polled,
            Dropped,
        }
        let now = self.current_cycle;
        let route = match self.links.get_mut(&link_id) {
            None => {
                tracing::warn!(link = link_id, "event addressed to an unknown link");
                Route::Dropped
            }
            Some(link) => match &link.delivery {
                Delivery::Functor(h) => Route::Handler(link.owner, *h),
                Delivery::Polling(_) => {
                    if let Some(p) = payload.clone() {
                        link.push_polled(now, p);
                    }
                    Route::Polled
                }
                Delivery::Unconfigured => {
                    tracing::warn!(link = link_id, "event delivered to an unconfigured link");
                    Route::Dropped
                }
            },
        };
        if let Route::Handler(owner, handler) = route {
            tracing::trace!(target: "events", link = link_id, comp = owner, cycle = now, "delivering event");
            self.with_component(owner, |c, ctx| c.on_event(ctx, handler, payload))??;
        }
        Ok(())
    }

    fn fire_clock(&mut self, clock: ClockId) -> Result<(), SimError> {
        self.clocks[clock].scheduled = false;
        let count = self.clocks[clock].begin_fire();
        let cycle = self.clocks[clock].cycle();
        tracing::trace!(target: "events", clock, cycle, handlers = count, "clock tick");
        for index in 0..count {
            let Some(handle) = self.clocks[clock].handler_at(index) else {
                continue;
            };
            let unregister =
                self.with_component(handle.comp, |c, ctx| c.on_clock(ctx, handle.handler, cycle))??;
            if unregister {
                self.clocks[clock].stage_remove(handle);
            }
        }
        if self.clocks[clock].end_fire() {
            self.schedule_clock(clock)?;
        }
        Ok(())
    }

    fn schedule_clock(&mut self, clock: ClockId) -> Result<(), SimError> {
        let at = checked_add(self.current_cycle, self.clocks[clock].period)?;
        self.vortex.insert(Activity::clock(at, clock));
        self.clocks[clock].scheduled = true;
        Ok(())
    }

    /// Performs one synchronization: flushes outboxes (plus null ticks on
    /// silent cross-rank links), drains peer inboxes into the vortex in
    /// (rank, send order) order, evaluates global exit state, and advances
    /// the window to the reduced horizon. Returns `true` when the whole
    /// run is finished.
    fn synchronize(&mut self, locally_done: bool) -> Result<bool, SimError> {
        let out = {
            let sync = self.sync.as_mut().expect("synchronize requires a multi-rank run");
            if !locally_done {
                let window_end = sync.window_end;
                for cross in &sync.cross_sends {
                    if !sync.sent.contains(&cross.dest) {
                        sync.outboxes.entry(cross.peer).or_default().push(WireEvent {
                            link_id: cross.dest,
                            delivery_time: window_end.saturating_add(cross.latency),
                            payload: None,
                        });
                    }
                }
            }
            sync.sent.clear();
            std::mem::take(&mut sync.outboxes)
        };

        let inboxes = self.fabric.exchange(out);
        for (from, events) in inboxes {
            for wire in events {
                tracing::trace!(target: "events", from, link = wire.link_id, at = wire.delivery_time, null = wire.payload.is_none(), "inbound event");
                let activity = match wire.payload {
                    Some(payload) => Activity::event(wire.delivery_time, wire.link_id, payload),
                    None => Activity::null(wire.delivery_time, wire.link_id),
                };
                self.vortex.insert(activity);
            }
        }

        let stops = self.fabric.all_reduce_sum(self.stop_flag as u64);
        if stops > 0 {
            tracing::info!(rank = self.rank(), "stop vote observed at the sync boundary");
            self.end_simulation();
            return Ok(true);
        }

        let ever = self.fabric.all_reduce_sum(self.exit.ever_registered() as u64);
        let refs = self.fabric.all_reduce_sum(self.exit.ref_count() as u64);
        if ever > 0 && refs == 0 {
            tracing::info!(rank = self.rank(), "global exit count reached zero");
            self.end_simulation();
            return Ok(true);
        }

        let local_next = if self.vortex.is_drained() {
            MAX_SIM_TIME
        } else {
            self.vortex
                .front()
                .map(|a| a.delivery_time)
                .unwrap_or(MAX_SIM_TIME)
        };
        let global_next = self.fabric.all_reduce_min(local_next);
        if global_next == MAX_SIM_TIME {
            return Ok(true);
        }
        let sync = self.sync.as_mut().expect("still multi-rank");
        sync.window_end = global_next.saturating_add(sync.lookahead);
        Ok(false)
    }

    fn shutdown(&mut self) -> Result<(), SimError> {
        let ids: Vec<ComponentId> = self.comps.keys().copied().collect();
        for id in ids {
            self.with_component(id, |comp, ctx| comp.finish(ctx))??;
        }
        Ok(())
    }

    /// Takes the component out of its slot, runs `f` with the component
    /// and a kernel context, and puts it back. The slot stays empty for
    /// the duration of the callback, so handlers are atomic with respect
    /// to the vortex and never reenter themselves.
    fn with_component<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component, &mut Ctx) -> R,
    ) -> Result<R, SimError> {
        let mut imp = self
            .comps
            .get_mut(&id)
            .and_then(|slot| slot.imp.take())
            .ok_or(SimError::ComponentNotFound(id))?;
        let mut ctx = Ctx { sim: self, comp: id };
        let result = f(imp.as_mut(), &mut ctx);
        self.comps
            .get_mut(&id)
            .expect("slot exists while its component is out")
            .imp = Some(imp);
        Ok(result)
    }

    // ---- kernel services reached through `Ctx` ----

    fn register_clock(
        &mut self,
        comp: ComponentId,
        freq: &str,
        handler: HandlerId,
        reg_all: bool,
    ) -> Result<TimeConverter, SimError> {
        let tc = self.lord.get_time_converter(freq)?;
        let clock = match self.clock_by_factor.get(&tc.factor()) {
            Some(&clock) => clock,
            None => {
                let clock = self.clocks.len();
                self.clocks.push(Clock::new(tc));
                self.clock_by_factor.insert(tc.factor(), clock);
                clock
            }
        };
        let needs_schedule = self.clocks[clock].register(ClockHandle { comp, handler });
        if needs_schedule && !self.clocks[clock].scheduled {
            self.schedule_clock(clock)?;
        }
        if reg_all {
            self.apply_default_time_base(comp, tc)?;
        }
        Ok(tc)
    }

    fn unregister_clock(&mut self, comp: ComponentId, tc: TimeConverter, handler: HandlerId) {
        if let Some(&clock) = self.clock_by_factor.get(&tc.factor()) {
            self.clocks[clock].unregister(ClockHandle { comp, handler });
        }
    }

    fn register_time_base(
        &mut self,
        comp: ComponentId,
        base: &str,
        reg_all: bool,
    ) -> Result<TimeConverter, SimError> {
        let tc = self.lord.get_time_converter(base)?;
        if reg_all {
            self.apply_default_time_base(comp, tc)?;
        } else if let Some(slot) = self.comps.get_mut(&comp) {
            slot.meta.default_time_base = Some(tc);
        }
        Ok(tc)
    }

    /// Installs `tc` as the component's default base and on every of its
    /// links that lacks one.
    fn apply_default_time_base(
        &mut self,
        comp: ComponentId,
        tc: TimeConverter,
    ) -> Result<(), SimError> {
        let slot = self
            .comps
            .get_mut(&comp)
            .ok_or(SimError::ComponentNotFound(comp))?;
        slot.meta.default_time_base = Some(tc);
        let link_ids: Vec<LinkId> = slot.meta.links.values().copied().collect();
        for id in link_ids {
            if let Some(link) = self.links.get_mut(&id) {
                if link.default_time_base.is_none() {
                    link.default_time_base = Some(tc);
                }
            }
        }
        Ok(())
    }

    fn configure_link(
        &mut self,
        comp: ComponentId,
        name: &str,
        time_base: Option<&str>,
        handler: Option<HandlerId>,
    ) -> Result<Option<LinkId>, SimError> {
        let slot = self
            .comps
            .get(&comp)
            .ok_or(SimError::ComponentNotFound(comp))?;
        let Some(&link_id) = slot.meta.links.get(name) else {
            return Ok(None);
        };
        let comp_default = slot.meta.default_time_base;
        let tc = match time_base {
            Some(base) => Some(self.lord.get_time_converter(base)?),
            None => None,
        };
        let link = self
            .links
            .get_mut(&link_id)
            .ok_or(SimError::LinkNotFound(link_id))?;
        match handler {
            Some(h) => link.set_functor(h),
            None => link.set_polling(),
        }
        if let Some(tc) = tc {
            link.default_time_base = Some(tc);
        } else if link.default_time_base.is_none() {
            link.default_time_base = comp_default;
        }
        Ok(Some(link_id))
    }

    fn add_self_link(&mut self, comp: ComponentId, name: &str) -> Result<LinkId, SimError> {
        let slot = self
            .comps
            .get_mut(&comp)
            .ok_or(SimError::ComponentNotFound(comp))?;
        if slot.meta.links.contains_key(name) {
            return Err(SimError::DuplicateSelfLink(name.to_string()));
        }
        let id = self.next_self_link_id;
        self.next_self_link_id += 1;
        self.links
            .insert(id, Link::self_link(id, comp, slot.meta.default_time_base));
        slot.meta.links.insert(name.to_string(), id);
        Ok(id)
    }

    fn send(&mut self, link_id: LinkId, delay: SimTime, payload: Bytes) -> Result<(), SimError> {
        let link = self
            .links
            .get(&link_id)
            .ok_or(SimError::LinkNotFound(link_id))?;
        let at = link.delivery_time(self.current_cycle, delay)?;
        match link.target {
            Target::Local { dest } => {
                self.vortex.insert(Activity::event(at, dest, payload));
            }
            Target::Remote { rank, dest } => {
                let sync = self
                    .sync
                    .as_mut()
                    .expect("a remote link target implies a multi-rank run");
                sync.sent.insert(dest);
                sync.outboxes.entry(rank).or_default().push(WireEvent {
                    link_id: dest,
                    delivery_time: at,
                    payload: Some(payload),
                });
            }
        }
        Ok(())
    }

    fn register_exit(&mut self, comp: ComponentId) -> bool {
        let changed = self.exit.ref_inc(comp);
        if changed && self.num_ranks() == 1 && !self.exit.scheduled {
            let at = self.current_cycle.saturating_add(self.exit.period);
            self.vortex.insert(Activity::check_exit(at));
            self.exit.scheduled = true;
        }
        changed
    }

    fn register_introspect(
        &mut self,
        comp: ComponentId,
        period: &str,
        handler: HandlerId,
    ) -> Result<TimeConverter, SimError> {
        let tc = self.lord.get_time_converter(period)?;
        let period = tc.factor();
        let at = checked_add(self.current_cycle, period)?;
        self.vortex.insert(Activity::introspect(at, comp, handler, period));
        Ok(tc)
    }
}

/// The kernel handle passed into every component callback.
pub struct Ctx<'a> {
    sim: &'a mut Simulation,
    comp: ComponentId,
}

impl<'a> Ctx<'a> {
    pub fn id(&self) -> ComponentId {
        self.comp
    }

    pub fn name(&self) -> &str {
        self.sim
            .comps
            .get(&self.comp)
            .map(|s| s.meta.name.as_str())
            .unwrap_or("?")
    }

    /// Current simulation time in core cycles.
    pub fn now(&self) -> SimTime {
        self.sim.current_cycle
    }

    /// Registers a clock handler at the given frequency or period,
    /// creating the shared clock on first use. With `reg_all`, the
    /// returned converter also becomes the default base of this component
    /// and of every link that lacks one.
    pub fn register_clock(
        &mut self,
        freq: &str,
        handler: HandlerId,
        reg_all: bool,
    ) -> Result<TimeConverter, SimError> {
        self.sim.register_clock(self.comp, freq, handler, reg_all)
    }

    pub fn unregister_clock(&mut self, tc: TimeConverter, handler: HandlerId) {
        self.sim.unregister_clock(self.comp, tc, handler);
    }

    /// Interns a time base without creating a clock.
    pub fn register_time_base(
        &mut self,
        base: &str,
        reg_all: bool,
    ) -> Result<TimeConverter, SimError> {
        self.sim.register_time_base(self.comp, base, reg_all)
    }

    /// Configures the named port's link. Returns `None` when the graph
    /// bound no link to that name. Without a handler the link becomes a
    /// polling link.
    pub fn configure_link(
        &mut self,
        name: &str,
        time_base: Option<&str>,
        handler: Option<HandlerId>,
    ) -> Result<Option<LinkId>, SimError> {
        self.sim.configure_link(self.comp, name, time_base, handler)
    }

    /// Creates a new zero-latency self-link. A duplicate name is fatal.
    pub fn add_self_link(&mut self, name: &str) -> Result<LinkId, SimError> {
        self.sim.add_self_link(self.comp, name)
    }

    /// Creates and configures a self-link in one step.
    pub fn configure_self_link(
        &mut self,
        name: &str,
        time_base: Option<&str>,
        handler: Option<HandlerId>,
    ) -> Result<LinkId, SimError> {
        self.sim.add_self_link(self.comp, name)?;
        Ok(self
            .sim
            .configure_link(self.comp, name, time_base, handler)?
            .expect("self-link was just added"))
    }

    /// Sends `payload` on a link after `delay` units of the link's
    /// default time base, plus the link latency.
    pub fn send(&mut self, link: LinkId, delay: SimTime, payload: Bytes) -> Result<(), SimError> {
        self.sim.send(link, delay, payload)
    }

    /// Pops the next delivered event from a polling link, if its delivery
    /// time has been reached.
    pub fn recv(&mut self, link: LinkId) -> Result<Option<Bytes>, SimError> {
        self.sim
            .links
            .get_mut(&link)
            .ok_or(SimError::LinkNotFound(link))?
            .poll(self.sim.current_cycle)
    }

    /// Current time converted into the given base.
    pub fn current_sim_time(&self, tc: TimeConverter) -> SimTime {
        tc.from_core(self.sim.current_cycle)
    }

    /// Current time converted into a base named by a time string.
    pub fn current_sim_time_in(&mut self, base: &str) -> Result<SimTime, SimError> {
        let tc = self.sim.lord.get_time_converter(base)?;
        Ok(self.current_sim_time(tc))
    }

    pub fn current_sim_time_nano(&self) -> Result<SimTime, SimError> {
        Ok(self.current_sim_time(self.sim.lord.nano()?))
    }

    pub fn current_sim_time_micro(&self) -> Result<SimTime, SimError> {
        Ok(self.current_sim_time(self.sim.lord.micro()?))
    }

    pub fn current_sim_time_milli(&self) -> Result<SimTime, SimError> {
        Ok(self.current_sim_time(self.sim.lord.milli()?))
    }

    /// Votes to keep the simulation alive. Returns whether the exit state
    /// changed.
    pub fn register_exit(&mut self) -> bool {
        self.sim.register_exit(self.comp)
    }

    /// Withdraws this component's termination vote. Returns whether the
    /// exit state changed.
    pub fn unregister_exit(&mut self) -> bool {
        self.sim.exit.ref_dec(self.comp)
    }

    /// Schedules a periodic introspection hook at the given period.
    pub fn register_introspect(
        &mut self,
        period: &str,
        handler: HandlerId,
    ) -> Result<TimeConverter, SimError> {
        self.sim.register_introspect(self.comp, period, handler)
    }

    /// Requests termination; the loop drains at the next pop.
    pub fn end_simulation(&mut self) {
        self.sim.end_simulation();
    }
}
