//! # pdes-engine::vortex
//!
//! The time vortex: the per-rank priority queue of activities. Insertion
//! stamps each activity with a monotone sequence number, so that pops come
//! out in strict `(delivery_time, priority, queue_order)` order and two
//! runs with identical insert sequences dispatch byte-identically.

use crate::activity::Activity;
use std::collections::BinaryHeap;

/// A min-heap of [`Activity`] with deterministic tie-breaking.
#[derive(Debug, Default)]
pub struct TimeVortex {
    data: BinaryHeap<Activity>,
    insert_order: u64,
    /// How many queued activities are passive (null ticks, introspection).
    passive: usize,
}

impl TimeVortex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an activity, stamping its queue order.
    pub fn insert(&mut self, mut activity: Activity) {
        activity.queue_order = self.insert_order;
        self.insert_order += 1;
        if activity.is_passive() {
            self.passive += 1;
        }
        self.data.push(activity);
    }

    /// Removes and returns the minimum activity.
    pub fn pop(&mut self) -> Option<Activity> {
        let activity = self.data.pop()?;
        if activity.is_passive() {
            self.passive -= 1;
        }
        Some(activity)
    }

    /// Peeks at the minimum activity without removing it.
    pub fn front(&self) -> Option<&Activity> {
        self.data.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether only passive activities remain. A drained vortex ends the
    /// simulation even while null ticks or introspection hooks are queued.
    pub fn is_drained(&self) -> bool {
        self.data.len() == self.passive
    }
}
