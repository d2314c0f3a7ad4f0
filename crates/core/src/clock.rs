//! Monotonic clock capability

use std::time::Instant;

/// Source of monotonic time for a debouncer
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
