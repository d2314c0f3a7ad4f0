//! Single-shot timer capability
//!
//! The scheduler never talks to a platform timer directly. It asks a
//! `Timer` to schedule a one-shot expiry for a slot and later cancels it
//! through the returned handle. Whoever owns the timer reports expiries
//! back with `Debouncer::on_expiry(slot, handle)`.

use std::fmt;
use std::time::Duration;

/// Which of the scheduler's two timers an expiry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    /// Quiet-period timer, re-armed with a shrinking delay
    Wait,
    /// Max-wait ceiling, armed once at burst start
    MaxWait,
}

/// Opaque identifier of a scheduled expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Create a handle from a raw id
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Raw id
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Schedule-once / cancel capability
pub trait Timer {
    /// Schedule an expiry for `slot` after `delay`
    fn schedule_once(&mut self, delay: Duration, slot: TimerSlot) -> TimerHandle;

    /// Cancel a scheduled expiry
    ///
    /// Cancelling a handle that already fired (or was never issued) is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

impl<T: Timer + ?Sized> Timer for Box<T> {
    fn schedule_once(&mut self, delay: Duration, slot: TimerSlot) -> TimerHandle {
        (**self).schedule_once(delay, slot)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        (**self).cancel(handle)
    }
}
