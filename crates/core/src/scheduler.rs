//! Debounce scheduler state machine
//!
//! Coalesces bursts of submissions into delayed deliveries of a target
//! operation. All state lives in `Debouncer` and every transition is one of
//! three methods:
//! - `submit` - a caller hands over new arguments
//! - `on_expiry` - one of the two timers fired
//! - `cancel` - drop whatever is pending
//!
//! Timing goes through the `Clock` and `Timer` capabilities so the same
//! state machine runs on Tokio, on virtual time, or on anything else that
//! can schedule a one-shot callback.

use crate::clock::Clock;
use crate::policy::DebouncePolicy;
use crate::timer::{Timer, TimerHandle, TimerSlot};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Counters describing what a debouncer has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DebounceStats {
    /// Calls to `submit`
    pub submitted: u64,
    /// Deliveries on the leading edge
    pub leading: u64,
    /// Deliveries on the trailing edge (including `flush`)
    pub trailing: u64,
    /// Pending arguments overwritten by a newer submission
    pub superseded: u64,
    /// Pending arguments dropped because trailing delivery is disabled
    pub discarded: u64,
    /// Pending arguments dropped by `cancel`
    pub cancelled: u64,
}

impl DebounceStats {
    /// Total number of times the target operation ran
    pub fn delivered(&self) -> u64 {
        self.leading + self.trailing
    }
}

/// Debounce scheduler
///
/// Wraps a target operation `F` and decides, per `DebouncePolicy`, whether
/// each submission is delivered immediately, deferred, or absorbed into the
/// pending call. Only the most recent arguments are kept.
pub struct Debouncer<F, A, R, T, C> {
    /// Target operation
    op: F,

    /// Immutable policy
    policy: DebouncePolicy,

    /// Timer capability
    timers: T,

    /// Clock capability
    clock: C,

    /// Latest arguments not yet delivered
    pending: Option<A>,

    /// Quiet-period timer
    wait_timer: Option<TimerHandle>,

    /// Max-wait ceiling timer
    max_wait_timer: Option<TimerHandle>,

    /// Time of the most recent submission
    last_call: Option<Instant>,

    /// Time of the last delivery (or burst start); `None` after a reset
    last_invoke: Option<Instant>,

    /// Result of the most recent delivery
    last_result: Option<R>,

    stats: DebounceStats,
}

impl<F, A, R, T, C> Debouncer<F, A, R, T, C>
where
    F: FnMut(A) -> R,
    R: Clone,
    T: Timer,
    C: Clock,
{
    /// Create a new debouncer around `op`
    pub fn new(op: F, policy: DebouncePolicy, timers: T, clock: C) -> Self {
        if !policy.fires() {
            warn!("Debounce policy has neither leading nor trailing edge; calls will never be delivered");
        }

        Self {
            op,
            policy,
            timers,
            clock,
            pending: None,
            wait_timer: None,
            max_wait_timer: None,
            last_call: None,
            last_invoke: None,
            last_result: None,
            stats: DebounceStats::default(),
        }
    }

    /// Submit a call
    ///
    /// Returns the result of this call if it was delivered on the leading
    /// edge, otherwise the result of the previous delivery (`None` before
    /// the first one). Deferred deliveries never happen inside `submit`.
    pub fn submit(&mut self, args: A) -> Option<R> {
        let now = self.clock.now();
        let invoking = self.should_invoke(now);

        self.stats.submitted += 1;
        if self.pending.replace(args).is_some() {
            self.stats.superseded += 1;
        }
        self.last_call = Some(now);

        if invoking && self.wait_timer.is_none() {
            // Burst start
            self.last_invoke = Some(now);

            if self.policy.leading {
                if let Some(args) = self.pending.take() {
                    debug!("Debounce burst started, delivering leading edge");
                    self.stats.leading += 1;
                    return Some(self.invoke(now, args));
                }
            }

            debug!("Debounce burst started (wait: {:?})", self.policy.wait());
            if let Some(max_wait) = self.policy.max_wait() {
                if self.max_wait_timer.is_none() {
                    self.max_wait_timer = Some(self.timers.schedule_once(max_wait, TimerSlot::MaxWait));
                }
            }
        }

        if self.wait_timer.is_none() {
            self.arm_wait(self.remaining_wait(now));
        }

        self.last_result.clone()
    }

    /// Handle a timer expiry
    ///
    /// Expiries whose handle no longer matches the armed timer for `slot`
    /// (cancelled, or already superseded) are ignored.
    pub fn on_expiry(&mut self, slot: TimerSlot, handle: TimerHandle) -> Option<R> {
        let armed = match slot {
            TimerSlot::Wait => &mut self.wait_timer,
            TimerSlot::MaxWait => &mut self.max_wait_timer,
        };
        if *armed != Some(handle) {
            trace!("Ignoring stale {:?} expiry for {}", slot, handle);
            return self.last_result.clone();
        }
        *armed = None;

        if self.pending.is_none() {
            self.clear_timers();
            return self.last_result.clone();
        }

        let now = self.clock.now();
        if self.should_invoke(now) {
            return self.trailing_edge(now);
        }

        // Burst still active: re-arm with whatever is left of the quiet
        // period, capped by the max-wait ceiling.
        if self.wait_timer.is_none() {
            let delay = self.remaining_wait(now);
            trace!("Re-arming debounce wait timer for {:?}", delay);
            self.arm_wait(delay);
        }

        self.last_result.clone()
    }

    /// Deliver the pending call now through the trailing edge
    pub fn flush(&mut self) -> Option<R> {
        if self.pending.is_none() {
            return self.last_result.clone();
        }

        let now = self.clock.now();
        self.trailing_edge(now)
    }

    fn should_invoke(&self, now: Instant) -> bool {
        let Some(last_call) = self.last_call else {
            return true;
        };

        if now.saturating_duration_since(last_call) >= self.policy.wait() {
            return true;
        }

        match (self.policy.max_wait(), self.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => {
                now.saturating_duration_since(last_invoke) >= max_wait
            }
            _ => false,
        }
    }

    fn remaining_wait(&self, now: Instant) -> Duration {
        let since_call = self
            .last_call
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        let until_wait = self.policy.wait().saturating_sub(since_call);

        match (self.policy.max_wait(), self.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => {
                let since_invoke = now.saturating_duration_since(last_invoke);
                until_wait.min(max_wait.saturating_sub(since_invoke))
            }
            _ => until_wait,
        }
    }

    fn trailing_edge(&mut self, now: Instant) -> Option<R> {
        self.clear_timers();

        match self.pending.take() {
            Some(args) if self.policy.trailing => {
                debug!("Debounce delivering trailing edge");
                self.stats.trailing += 1;
                Some(self.invoke(now, args))
            }
            Some(_) => {
                debug!("Debounce burst ended without trailing delivery");
                self.stats.discarded += 1;
                self.last_result.clone()
            }
            None => self.last_result.clone(),
        }
    }

    fn invoke(&mut self, now: Instant, args: A) -> R {
        self.last_invoke = Some(now);
        let result = (self.op)(args);
        self.last_result = Some(result.clone());
        result
    }

    fn arm_wait(&mut self, delay: Duration) {
        self.wait_timer = Some(self.timers.schedule_once(delay, TimerSlot::Wait));
    }
}

impl<F, A, R, T, C> Debouncer<F, A, R, T, C>
where
    T: Timer,
{
    /// Drop the pending call and disarm both timers
    ///
    /// Does not touch the cached result. Calling it with nothing pending
    /// is a no-op.
    pub fn cancel(&mut self) {
        let had_pending = self.pending.take().is_some();
        self.clear_timers();
        self.last_call = None;
        self.last_invoke = None;

        if had_pending {
            self.stats.cancelled += 1;
            debug!("Debounce cancelled pending call");
        }
    }

    /// Whether a call is waiting to be delivered
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the timer for `slot` is armed
    pub fn is_armed(&self, slot: TimerSlot) -> bool {
        match slot {
            TimerSlot::Wait => self.wait_timer.is_some(),
            TimerSlot::MaxWait => self.max_wait_timer.is_some(),
        }
    }

    /// Result of the most recent delivery
    pub fn last_result(&self) -> Option<&R> {
        self.last_result.as_ref()
    }

    /// Policy this debouncer was built with
    pub fn policy(&self) -> &DebouncePolicy {
        &self.policy
    }

    /// Counters
    pub fn stats(&self) -> DebounceStats {
        self.stats
    }

    /// Timer capability
    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Timer capability (mutable)
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Clock capability
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn clear_timers(&mut self) {
        if let Some(handle) = self.wait_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.max_wait_timer.take() {
            self.timers.cancel(handle);
        }
    }
}
