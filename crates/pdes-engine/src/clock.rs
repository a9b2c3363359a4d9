//! # pdes-engine::clock
//!
//! Periodic clocks. One clock exists per distinct period; components share
//! it by registering handlers, which fire in registration order. Handler
//! list mutation during a fire is staged: unregisters take effect once the
//! current tick completes, new registrations first fire on the next tick.

use crate::prelude::*;

/// One handler registration on a clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockHandle {
    pub comp: ComponentId,
    pub handler: HandlerId,
}

/// A shared periodic clock.
#[derive(Debug)]
pub struct Clock {
    pub period: SimTime,
    pub time_base: TimeConverter,
    handlers: Vec<ClockHandle>,
    pending_add: Vec<ClockHandle>,
    staged_remove: Vec<ClockHandle>,
    /// Tick counter in clock units, passed to handlers.
    cycle: u64,
    /// An inactive clock has no handlers and is not rescheduled.
    active: bool,
    firing: bool,
    /// Whether a tick activity for this clock is currently in the vortex.
    /// Guards reactivation against scheduling a second tick.
    pub scheduled: bool,
}

impl Clock {
    pub fn new(time_base: TimeConverter) -> Self {
        Self {
            period: time_base.factor(),
            time_base,
            handlers: Vec::new(),
            pending_add: Vec::new(),
            staged_remove: Vec::new(),
            cycle: 0,
            active: false,
            firing: false,
            scheduled: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_firing(&self) -> bool {
        self.firing
    }

    /// Adds a handler. Returns `true` when the clock was inactive and now
    /// needs (re)scheduling. During a fire the addition is staged for the
    /// next tick.
    pub fn register(&mut self, handle: ClockHandle) -> bool {
        if self.firing {
            self.pending_add.push(handle);
            return false;
        }
        self.handlers.push(handle);
        let needs_schedule = !self.active;
        self.active = true;
        needs_schedule
    }

    /// Removes a handler. During a fire the removal is staged until the
    /// current tick completes.
    pub fn unregister(&mut self, handle: ClockHandle) {
        if self.firing {
            self.staged_remove.push(handle);
        } else {
            self.handlers.retain(|h| *h != handle);
            if self.handlers.is_empty() {
                self.active = false;
            }
        }
    }

    /// Starts a tick: bumps the cycle count and freezes the handler list.
    /// Returns the handler count for this tick.
    pub fn begin_fire(&mut self) -> usize {
        self.firing = true;
        self.cycle += 1;
        self.handlers.len()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The handler at `index` in this tick's frozen list, skipping entries
    /// already staged for removal.
    pub fn handler_at(&self, index: usize) -> Option<ClockHandle> {
        let h = *self.handlers.get(index)?;
        if self.staged_remove.contains(&h) {
            return None;
        }
        Some(h)
    }

    pub fn stage_remove(&mut self, handle: ClockHandle) {
        self.staged_remove.push(handle);
    }

    /// Ends a tick: applies staged removals, admits pending additions, and
    /// reports whether the clock should be rescheduled.
    pub fn end_fire(&mut self) -> bool {
        self.firing = false;
        let removes = std::mem::take(&mut self.staged_remove);
        self.handlers.retain(|h| !removes.contains(h));
        self.handlers.append(&mut self.pending_add);
        self.active = !self.handlers.is_empty();
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdes_types::time::TimeLord;

    fn clock() -> Clock {
        let tc = TimeLord::new("1 ps")
            .unwrap()
            .get_time_converter("1 ns")
            .unwrap();
        Clock::new(tc)
    }

    fn handle(n: u64) -> ClockHandle {
        ClockHandle { comp: n, handler: n }
    }

    #[test]
    fn period_comes_from_the_time_base() {
        assert_eq!(clock().period, 1_000);
    }

    #[test]
    fn registration_activates_and_drain_deactivates() {
        let mut c = clock();
        assert!(c.register(handle(0)));
        assert!(!c.register(handle(1)), "already active");
        c.unregister(handle(0));
        assert!(c.is_active());
        c.unregister(handle(1));
        assert!(!c.is_active());
        assert!(c.register(handle(2)), "reactivation needs a reschedule");
    }

    #[test]
    fn removal_during_fire_is_deferred_to_the_tick_end() {
        let mut c = clock();
        c.register(handle(0));
        c.register(handle(1));
        let n = c.begin_fire();
        assert_eq!(n, 2);
        c.stage_remove(handle(0));
        // Still present in the frozen list until the tick ends.
        assert_eq!(c.handler_at(1), Some(handle(1)));
        assert_eq!(c.handler_at(0), None, "staged removals are skipped");
        assert!(c.end_fire());
        assert_eq!(c.begin_fire(), 1);
        assert_eq!(c.handler_at(0), Some(handle(1)));
        c.end_fire();
    }

    #[test]
    fn registration_during_fire_first_fires_next_tick() {
        let mut c = clock();
        c.register(handle(0));
        let n = c.begin_fire();
        assert!(!c.register(handle(1)));
        assert_eq!(n, 1, "the frozen count does not grow");
        assert!(c.end_fire());
        assert_eq!(c.begin_fire(), 2);
        c.end_fire();
    }

    #[test]
    fn cycle_counter_advances_per_tick() {
        let mut c = clock();
        c.register(handle(0));
        c.begin_fire();
        c.end_fire();
        c.begin_fire();
        c.end_fire();
        assert_eq!(c.cycle(), 2);
    }
}
