//! Virtual time for deterministic replay
//!
//! `ManualClock` only moves when told to, and `ManualTimers` keeps
//! scheduled expiries in a queue instead of handing them to a runtime.
//! `Debouncer::advance_to` ties the two together: it walks the clock
//! forward, firing every due expiry in deadline order.

use crate::clock::Clock;
use crate::scheduler::Debouncer;
use crate::timer::{Timer, TimerHandle, TimerSlot};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clock that advances only when told to
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock at virtual time zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Virtual time since creation
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Move the clock to `elapsed`
    ///
    /// The clock never goes backwards; earlier values are ignored.
    pub fn set(&self, elapsed: Duration) {
        let mut current = self.elapsed.lock();
        if elapsed > *current {
            *current = elapsed;
        }
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        *self.elapsed.lock() += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    deadline: Duration,
    handle: TimerHandle,
    slot: TimerSlot,
}

/// Timer queue driven by a `ManualClock`
///
/// Sized for a single debouncer, which holds at most two live timers: the
/// queue stays inline and lookups scan it linearly. Not meant as a general
/// timer wheel for many concurrent expiries.
#[derive(Debug)]
pub struct ManualTimers {
    clock: ManualClock,
    next_id: u64,
    queue: SmallVec<[Scheduled; 4]>,
}

impl ManualTimers {
    /// Create an empty queue reading deadlines from `clock`
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            next_id: 0,
            queue: SmallVec::new(),
        }
    }

    /// Earliest scheduled deadline, in virtual time
    pub fn next_deadline(&self) -> Option<Duration> {
        self.earliest().map(|index| self.queue[index].deadline)
    }

    /// Remove and return the earliest expiry due at or before `at`
    ///
    /// Ties are broken by scheduling order.
    pub fn pop_due(&mut self, at: Duration) -> Option<(TimerSlot, TimerHandle)> {
        let index = self.earliest()?;
        if self.queue[index].deadline > at {
            return None;
        }

        let entry = self.queue.remove(index);
        Some((entry.slot, entry.handle))
    }

    /// Number of scheduled expiries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is scheduled
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    // Linear scan; the queue holds a handful of entries at most
    fn earliest(&self) -> Option<usize> {
        self.queue
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| (entry.deadline, entry.handle))
            .map(|(index, _)| index)
    }
}

impl Timer for ManualTimers {
    fn schedule_once(&mut self, delay: Duration, slot: TimerSlot) -> TimerHandle {
        let handle = TimerHandle::from_raw(self.next_id);
        self.next_id += 1;

        self.queue.push(Scheduled {
            deadline: self.clock.elapsed() + delay,
            handle,
            slot,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.retain(|entry| entry.handle != handle);
    }
}

impl<F, A, R> Debouncer<F, A, R, ManualTimers, ManualClock>
where
    F: FnMut(A) -> R,
    R: Clone,
{
    /// Advance virtual time to `until`, firing due expiries in order
    ///
    /// The clock is set to each expiry's deadline before it fires, so the
    /// scheduler observes exact times. Returns the number of expiries fired.
    pub fn advance_to(&mut self, until: Duration) -> usize {
        let mut fired = 0;

        while let Some(deadline) = self.timers().next_deadline().filter(|d| *d <= until) {
            self.clock().set(deadline);
            if let Some((slot, handle)) = self.timers_mut().pop_due(deadline) {
                self.on_expiry(slot, handle);
                fired += 1;
            }
        }

        self.clock().set(until);
        fired
    }

    /// Advance virtual time by `delta`
    pub fn advance_by(&mut self, delta: Duration) -> usize {
        let until = self.clock().elapsed() + delta;
        self.advance_to(until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_manual_clock_is_shared_and_monotonic() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();

        other.advance(ms(30));
        assert_eq!(clock.elapsed(), ms(30));
        assert_eq!(clock.now() - start, ms(30));

        clock.set(ms(10));
        assert_eq!(other.elapsed(), ms(30));
    }

    #[test]
    fn test_timers_pop_in_deadline_then_schedule_order() {
        let clock = ManualClock::new();
        let mut timers = ManualTimers::new(clock.clone());

        let late = timers.schedule_once(ms(50), TimerSlot::Wait);
        let first = timers.schedule_once(ms(20), TimerSlot::MaxWait);
        let second = timers.schedule_once(ms(20), TimerSlot::Wait);

        assert_eq!(timers.next_deadline(), Some(ms(20)));
        assert_eq!(timers.pop_due(ms(10)), None);
        assert_eq!(timers.pop_due(ms(20)), Some((TimerSlot::MaxWait, first)));
        assert_eq!(timers.pop_due(ms(20)), Some((TimerSlot::Wait, second)));
        assert_eq!(timers.pop_due(ms(100)), Some((TimerSlot::Wait, late)));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel_removes_scheduled_expiry() {
        let clock = ManualClock::new();
        let mut timers = ManualTimers::new(clock.clone());

        let handle = timers.schedule_once(ms(5), TimerSlot::Wait);
        timers.schedule_once(ms(7), TimerSlot::MaxWait);
        timers.cancel(handle);
        timers.cancel(handle);

        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(ms(7)));
    }

    #[test]
    fn test_deadlines_are_relative_to_clock() {
        let clock = ManualClock::new();
        let mut timers = ManualTimers::new(clock.clone());

        clock.advance(ms(100));
        timers.schedule_once(ms(25), TimerSlot::Wait);

        assert_eq!(timers.next_deadline(), Some(ms(125)));
    }
}
