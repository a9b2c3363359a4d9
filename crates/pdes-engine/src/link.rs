//! # pdes-engine::link
//!
//! Runtime links: the latency-delayed delivery channels between component
//! ports. Every configured graph link becomes two halves, one per
//! endpoint; a component sends on its own half and the event is addressed
//! to the opposite half, which knows how to hand it to its owner. A
//! self-link is a half whose target is itself.
//!
//! Link ids are a pure function of the configuration graph (`graph_id * 2
//! + endpoint`), so every rank derives the same ids and cross-rank events
//! can be addressed by id alone. Self-links are allocated from a separate,
//! rank-local range.

use crate::prelude::*;
use bytes::Bytes;
use std::collections::VecDeque;

/// First id handed to runtime-created self-links. Graph-derived ids grow
/// from zero; the two ranges never meet in practice.
pub const SELF_LINK_BASE: LinkId = 1 << 63;

/// The engine id of the receiving half for endpoint `slot` of a graph link.
pub fn endpoint_link_id(graph_link: LinkId, slot: usize) -> LinkId {
    graph_link * 2 + slot as LinkId
}

/// How events addressed to a link half reach the owning component.
#[derive(Debug)]
pub enum Delivery {
    /// Not yet configured; deliveries are dropped with a warning.
    Unconfigured,
    /// Invoke the owner's `on_event` with this handler id.
    Functor(HandlerId),
    /// Queue for the owner to poll via `recv`, FIFO in delivery order.
    Polling(VecDeque<(SimTime, Bytes)>),
}

/// Where sends on a link half go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The opposite half lives on this rank (`dest == id` for self-links).
    Local { dest: LinkId },
    /// The opposite half lives on a peer rank; sends travel through the
    /// per-peer outbox and the sync boundary.
    Remote { rank: Rank, dest: LinkId },
}

/// One half of a link, owned by its receiving component.
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub owner: ComponentId,
    pub default_time_base: Option<TimeConverter>,
    /// Delay added to every send, in core cycles. Zero only for
    /// self-links.
    pub latency: SimTime,
    pub delivery: Delivery,
    pub target: Target,
}

impl Link {
    pub fn new(id: LinkId, owner: ComponentId, latency: SimTime, target: Target) -> Self {
        Self {
            id,
            owner,
            default_time_base: None,
            latency,
            delivery: Delivery::Unconfigured,
            target,
        }
    }

    /// Creates a zero-latency half whose sends loop back to itself.
    pub fn self_link(id: LinkId, owner: ComponentId, default_time_base: Option<TimeConverter>) -> Self {
        Self {
            id,
            owner,
            default_time_base,
            latency: 0,
            delivery: Delivery::Unconfigured,
            target: Target::Local { dest: id },
        }
    }

    pub fn set_functor(&mut self, handler: HandlerId) {
        self.delivery = Delivery::Functor(handler);
    }

    pub fn set_polling(&mut self) {
        self.delivery = Delivery::Polling(VecDeque::new());
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.delivery, Delivery::Polling(_))
    }

    /// The timestamp a send issued `now` with `delay` units of the link's
    /// default time base arrives at.
    pub fn delivery_time(&self, now: SimTime, delay: SimTime) -> Result<SimTime, SimError> {
        let base = self.default_time_base.ok_or(SimError::NoTimeBase(self.id))?;
        let offset = checked_add(base.to_core(delay), self.latency)?;
        checked_add(now, offset)
    }

    /// Queues a delivered event on a polling link.
    pub fn push_polled(&mut self, at: SimTime, payload: Bytes) {
        if let Delivery::Polling(queue) = &mut self.delivery {
            queue.push_back((at, payload));
        }
    }

    /// Pops the next polled event whose delivery time has been reached.
    pub fn poll(&mut self, now: SimTime) -> Result<Option<Bytes>, SimError> {
        let Delivery::Polling(queue) = &mut self.delivery else {
            return Err(SimError::NotPolling(self.id));
        };
        match queue.front() {
            Some((at, _)) if *at <= now => Ok(queue.pop_front().map(|(_, p)| p)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdes_types::time::TimeLord;

    fn converter(spec: &str) -> TimeConverter {
        TimeLord::new("1 ps").unwrap().get_time_converter(spec).unwrap()
    }

    #[test]
    fn delivery_time_adds_base_scaled_delay_and_latency() {
        let mut link = Link::new(0, 0, 10_000, Target::Local { dest: 1 });
        link.default_time_base = Some(converter("1 ns"));
        // now + 3 ns + 10 ns latency
        assert_eq!(link.delivery_time(500, 3).unwrap(), 500 + 3_000 + 10_000);
    }

    #[test]
    fn sends_without_a_time_base_are_rejected() {
        let link = Link::new(7, 0, 1, Target::Local { dest: 7 });
        assert!(matches!(
            link.delivery_time(0, 1),
            Err(SimError::NoTimeBase(7))
        ));
    }

    #[test]
    fn polling_is_fifo_and_respects_delivery_time() {
        let mut link = Link::self_link(SELF_LINK_BASE, 0, Some(converter("1 ns")));
        link.set_polling();
        link.push_polled(10, Bytes::from_static(b"a"));
        link.push_polled(20, Bytes::from_static(b"b"));
        assert_eq!(link.poll(5).unwrap(), None);
        assert_eq!(link.poll(15).unwrap(), Some(Bytes::from_static(b"a")));
        assert_eq!(link.poll(15).unwrap(), None);
        assert_eq!(link.poll(20).unwrap(), Some(Bytes::from_static(b"b")));
    }

    #[test]
    fn poll_on_a_functor_link_is_an_error() {
        let mut link = Link::new(3, 0, 1, Target::Local { dest: 2 });
        link.set_functor(0);
        assert!(matches!(link.poll(0), Err(SimError::NotPolling(3))));
    }

    #[test]
    fn endpoint_ids_are_disjoint_per_slot() {
        assert_eq!(endpoint_link_id(0, 0), 0);
        assert_eq!(endpoint_link_id(0, 1), 1);
        assert_eq!(endpoint_link_id(5, 0), 10);
        assert_eq!(endpoint_link_id(5, 1), 11);
    }
}
