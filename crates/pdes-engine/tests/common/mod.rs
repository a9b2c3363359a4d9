//! Shared test components and builders for the integration suites.

// Each integration binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use bytes::Bytes;
use pdes_engine::prelude::*;
use std::sync::{Arc, Mutex};

/// Timestamped one-byte payload log, shared with the test body.
pub type EventLog = Arc<Mutex<Vec<(SimTime, u8)>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn lord() -> TimeLord {
    TimeLord::new("1 ps").unwrap()
}

pub fn single_rank(graph: &ConfigGraph, factory: &Factory) -> Simulation {
    Simulation::build(graph, factory, lord(), Box::new(SingleRank)).unwrap()
}

/// Replies with payload 2 when it receives payload 1; the initiator opens
/// with payload 1 at setup.
pub struct Echo {
    pub initiator: bool,
    pub log: EventLog,
    link: Option<LinkId>,
}

impl Echo {
    pub fn new(initiator: bool, log: EventLog) -> Self {
        Self {
            initiator,
            log,
            link: None,
        }
    }
}

impl Component for Echo {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        let link = ctx
            .configure_link("port", Some("1 ns"), Some(0))?
            .expect("the graph binds a link to 'port'");
        self.link = Some(link);
        if self.initiator {
            ctx.send(link, 0, Bytes::from_static(&[1]))?;
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        let Some(payload) = payload else {
            return Ok(());
        };
        self.log.lock().unwrap().push((ctx.now(), payload[0]));
        if payload[0] == 1 {
            ctx.send(self.link.expect("configured in setup"), 0, Bytes::from_static(&[2]))?;
        }
        Ok(())
    }
}

/// Re-arms a zero-latency self-link a fixed number of times with a 5 ns
/// delay.
pub struct SelfTimer {
    pub remaining: u32,
    pub log: EventLog,
    link: Option<LinkId>,
}

impl SelfTimer {
    pub fn new(remaining: u32, log: EventLog) -> Self {
        Self {
            remaining,
            log,
            link: None,
        }
    }
}

impl Component for SelfTimer {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        ctx.register_time_base("1 ns", true)?;
        let link = ctx.configure_self_link("timer", None, Some(0))?;
        self.link = Some(link);
        ctx.send(link, 5, Bytes::from_static(&[0]))?;
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        _payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        self.log.lock().unwrap().push((ctx.now(), 0));
        self.remaining -= 1;
        if self.remaining > 0 {
            ctx.send(self.link.expect("configured in setup"), 5, Bytes::from_static(&[0]))?;
        }
        Ok(())
    }
}

/// Floods its own functor self-link with one event per nanosecond.
pub struct Burst {
    pub count: u64,
    pub log: EventLog,
}

impl Component for Burst {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        ctx.register_time_base("1 ns", true)?;
        let link = ctx.configure_self_link("burst", None, Some(0))?;
        for i in 1..=self.count {
            ctx.send(link, i, Bytes::from_static(&[0]))?;
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        _payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        self.log.lock().unwrap().push((ctx.now(), 0));
        Ok(())
    }
}

/// Registers with the exit coordinator at setup and withdraws after a
/// single delayed self-event.
pub struct ExitVoter {
    pub delay_ns: SimTime,
}

impl Component for ExitVoter {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        assert!(ctx.register_exit());
        ctx.register_time_base("1 ns", true)?;
        let link = ctx.configure_self_link("done", None, Some(0))?;
        ctx.send(link, self.delay_ns, Bytes::from_static(&[0]))?;
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        _payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        assert!(ctx.unregister_exit());
        Ok(())
    }
}
