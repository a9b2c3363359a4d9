//! # pdes-engine::activity
//!
//! Defines `Activity`, the unit of scheduling, and the `Action` variants it
//! dispatches to. An `Activity` wraps an action with its delivery time, a
//! priority, and an insertion sequence number for deterministic
//! tie-breaking, making it suitable for the `BinaryHeap` behind the
//! [`TimeVortex`](crate::vortex::TimeVortex).

use crate::prelude::*;
use bytes::Bytes;
use std::cmp::Ordering;

/// Scheduling priorities. Lower numbers fire first at equal times.
pub mod priority {
    /// Pre-scheduled stop requests beat everything else at their cycle.
    pub const STOP: i32 = 1;
    /// Periodic introspection hooks.
    pub const INTROSPECT: i32 = 30;
    /// Clock ticks.
    pub const CLOCK: i32 = 40;
    /// Event and null-event deliveries.
    pub const EVENT: i32 = 50;
    /// The termination coordinator's periodic check.
    pub const EXIT_CHECK: i32 = 90;
}

/// A user event in flight: an opaque payload addressed to the receiving
/// half of a link.
#[derive(Debug, Clone)]
pub struct Event {
    pub link_id: LinkId,
    pub payload: Bytes,
}

/// A payload-less tick sent on an otherwise silent cross-rank link so the
/// receiving rank can safely advance its window. Delivered as a `None`
/// payload and dropped afterwards.
#[derive(Debug, Clone)]
pub struct NullEvent {
    pub link_id: LinkId,
}

/// Everything an [`Activity`] can do when it reaches the front of the
/// vortex.
#[derive(Debug)]
pub enum Action {
    /// Deliver a user event on a link.
    Event(Event),
    /// Deliver a null tick on a link.
    Null(NullEvent),
    /// Fire every handler registered on a clock.
    Clock { clock: ClockId },
    /// Evaluate the termination coordinator.
    CheckExit,
    /// Stop the simulation, optionally printing a message first.
    Stop { message: Option<String> },
    /// Invoke a component's introspection hook, then reschedule.
    Introspect {
        comp: ComponentId,
        handler: HandlerId,
        period: SimTime,
    },
}

/// Engine-internal index of a clock in the clock registry.
pub type ClockId = usize;

/// An action scheduled in the time vortex.
///
/// The ordering key is the lexicographic triple `(delivery_time, priority,
/// queue_order)`; `queue_order` is stamped by the vortex on insert, so the
/// triple is unique for live activities in one vortex.
#[derive(Debug)]
pub struct Activity {
    pub delivery_time: SimTime,
    pub priority: i32,
    /// Monotonic insertion sequence, stamped by the vortex.
    pub queue_order: u64,
    pub action: Action,
}

impl Activity {
    pub fn new(delivery_time: SimTime, priority: i32, action: Action) -> Self {
        Self {
            delivery_time,
            priority,
            queue_order: 0,
            action,
        }
    }

    pub fn event(at: SimTime, link_id: LinkId, payload: Bytes) -> Self {
        Self::new(at, priority::EVENT, Action::Event(Event { link_id, payload }))
    }

    pub fn null(at: SimTime, link_id: LinkId) -> Self {
        Self::new(at, priority::EVENT, Action::Null(NullEvent { link_id }))
    }

    pub fn clock(at: SimTime, clock: ClockId) -> Self {
        Self::new(at, priority::CLOCK, Action::Clock { clock })
    }

    pub fn check_exit(at: SimTime) -> Self {
        Self::new(at, priority::EXIT_CHECK, Action::CheckExit)
    }

    pub fn stop(at: SimTime, message: Option<String>) -> Self {
        Self::new(at, priority::STOP, Action::Stop { message })
    }

    pub fn introspect(at: SimTime, comp: ComponentId, handler: HandlerId, period: SimTime) -> Self {
        Self::new(
            at,
            priority::INTROSPECT,
            Action::Introspect {
                comp,
                handler,
                period,
            },
        )
    }

    /// Passive activities never keep a simulation alive: a vortex holding
    /// only passive entries counts as drained.
    pub fn is_passive(&self) -> bool {
        matches!(self.action, Action::Null(_) | Action::Introspect { .. })
    }

    fn key(&self) -> (SimTime, i32, u64) {
        (self.delivery_time, self.priority, self.queue_order)
    }
}

// The following implementations are what make the `BinaryHeap` behave as a
// deterministic min-heap.

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Activity {}

impl PartialOrd for Activity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Activity {
    /// `BinaryHeap` is a max-heap, so the comparison is reversed to pop the
    /// smallest `(delivery_time, priority, queue_order)` first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}
