//! Tokio-backed clock and timer capabilities
//!
//! Each scheduled expiry is a small task sleeping until its deadline. When
//! it wakes it reports `(slot, handle)` on a channel; the owner of the
//! debouncer drains that channel and calls `on_expiry`. Cancelling aborts
//! the task, and the debouncer ignores any expiry that was already in
//! flight.

use debounce_core::{Clock, Timer, TimerHandle, TimerSlot};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Expiry reported by a `TokioTimers` task
pub type Expiry = (TimerSlot, TimerHandle);

/// Clock reading Tokio's time source
///
/// Follows paused and advanced time in `tokio::time` test utilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Timer capability backed by Tokio sleep tasks
#[derive(Debug)]
pub struct TokioTimers {
    /// Runtime hosting the sleep tasks
    runtime: Handle,

    /// Where expiries are reported
    expiry_tx: mpsc::UnboundedSender<Expiry>,

    /// Next handle id
    next_id: u64,

    /// Live sleep tasks
    tasks: Vec<(TimerHandle, JoinHandle<()>)>,
}

impl TokioTimers {
    /// Create timers spawning onto `runtime` and reporting on `expiry_tx`
    pub fn new(runtime: Handle, expiry_tx: mpsc::UnboundedSender<Expiry>) -> Self {
        Self {
            runtime,
            expiry_tx,
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    /// Number of sleep tasks not yet finished or cancelled
    pub fn live(&self) -> usize {
        self.tasks.iter().filter(|(_, task)| !task.is_finished()).count()
    }
}

impl Timer for TokioTimers {
    fn schedule_once(&mut self, delay: Duration, slot: TimerSlot) -> TimerHandle {
        self.tasks.retain(|(_, task)| !task.is_finished());

        let handle = TimerHandle::from_raw(self.next_id);
        self.next_id += 1;

        let deadline = tokio::time::Instant::now() + delay;
        let expiry_tx = self.expiry_tx.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the debouncer was dropped
            let _ = expiry_tx.send((slot, handle));
        });

        trace!("Scheduled {:?} expiry {} in {:?}", slot, handle, delay);
        self.tasks.push((handle, task));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(index) = self.tasks.iter().position(|(h, _)| *h == handle) {
            let (_, task) = self.tasks.swap_remove(index);
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_reported_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TokioTimers::new(Handle::current(), tx);

        let start = tokio::time::Instant::now();
        let handle = timers.schedule_once(Duration::from_millis(100), TimerSlot::Wait);

        let expiry = rx.recv().await.unwrap();
        assert_eq!(expiry, (TimerSlot::Wait, handle));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = TokioTimers::new(Handle::current(), tx);

        let cancelled = timers.schedule_once(Duration::from_millis(50), TimerSlot::MaxWait);
        let kept = timers.schedule_once(Duration::from_millis(80), TimerSlot::Wait);
        timers.cancel(cancelled);
        timers.cancel(cancelled);
        assert_eq!(timers.live(), 1);

        let expiry = rx.recv().await.unwrap();
        assert_eq!(expiry, (TimerSlot::Wait, kept));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_paused_time() {
        let clock = TokioClock;
        let before = clock.now();

        tokio::time::advance(Duration::from_millis(250)).await;

        assert_eq!(clock.now() - before, Duration::from_millis(250));
    }
}
