//! Debounced callable driven by Tokio
//!
//! `Debounced` owns a `Debouncer` behind a mutex and a pump task that feeds
//! timer expiries back into it. Calls, cancellation and expiries are
//! serialized by the mutex, so the scheduler sees the same non-reentrant,
//! one-at-a-time execution it would get on a single-threaded event loop.

use crate::driver::{Expiry, TokioClock, TokioTimers};
use debounce_core::{DebounceError, DebouncePolicy, DebounceStats, Debouncer, Result};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

type BoxedOp<A, R> = Box<dyn FnMut(A) -> R + Send>;
type Core<A, R> = Debouncer<BoxedOp<A, R>, A, R, TokioTimers, TokioClock>;

/// Debounced wrapper around a target operation
///
/// The operation runs while the internal lock is held: it must not call
/// back into the same `Debounced`. Dropping the wrapper cancels any pending
/// call; operations already delivered are unaffected.
pub struct Debounced<A, R> {
    core: Arc<Mutex<Core<A, R>>>,
    pump: JoinHandle<()>,
}

/// Debounce `op` with a trailing-edge policy and the given quiet period
pub fn debounce<A, R, F>(op: F, wait: Duration) -> Result<Debounced<A, R>>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: FnMut(A) -> R + Send + 'static,
{
    Debounced::new(op, DebouncePolicy::new(wait))
}

impl<A, R> Debounced<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Wrap `op` on the current Tokio runtime
    ///
    /// Fails with `DebounceError::NoRuntime` outside a runtime context.
    pub fn new<F>(op: F, policy: DebouncePolicy) -> Result<Self>
    where
        F: FnMut(A) -> R + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| DebounceError::NoRuntime)?;
        Ok(Self::with_handle(op, policy, runtime))
    }

    /// Wrap `op`, hosting timers on `runtime`
    pub fn with_handle<F>(op: F, policy: DebouncePolicy, runtime: Handle) -> Self
    where
        F: FnMut(A) -> R + Send + 'static,
    {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let timers = TokioTimers::new(runtime.clone(), expiry_tx);
        let op: BoxedOp<A, R> = Box::new(op);

        let core = Arc::new(Mutex::new(Debouncer::new(op, policy, timers, TokioClock)));
        let pump = runtime.spawn(pump_expiries(Arc::downgrade(&core), expiry_rx));

        debug!(
            "Debounced operation ready (wait: {:?}, max_wait: {:?}, leading: {}, trailing: {})",
            policy.wait(),
            policy.max_wait(),
            policy.leading,
            policy.trailing
        );

        Self { core, pump }
    }

    /// Submit a call
    ///
    /// Returns the leading-edge result if this call was delivered
    /// immediately, otherwise the result of the previous delivery.
    pub fn call(&self, args: A) -> Option<R> {
        self.core.lock().submit(args)
    }

    /// Deliver the pending call now
    pub fn flush(&self) -> Option<R> {
        self.core.lock().flush()
    }

    /// Result of the most recent delivery
    pub fn last_result(&self) -> Option<R> {
        self.core.lock().last_result().cloned()
    }
}

impl<A, R> Debounced<A, R> {
    /// Drop the pending call without delivering it
    pub fn cancel(&self) {
        self.core.lock().cancel();
    }

    /// Whether a call is waiting to be delivered
    pub fn is_pending(&self) -> bool {
        self.core.lock().is_pending()
    }

    /// Counters
    pub fn stats(&self) -> DebounceStats {
        self.core.lock().stats()
    }

    /// Policy in effect
    pub fn policy(&self) -> DebouncePolicy {
        *self.core.lock().policy()
    }
}

impl<A, R> Drop for Debounced<A, R> {
    fn drop(&mut self) {
        self.core.lock().cancel();
        self.pump.abort();
    }
}

/// Feed timer expiries into the debouncer until it goes away
async fn pump_expiries<A, R>(core: Weak<Mutex<Core<A, R>>>, mut expiry_rx: mpsc::UnboundedReceiver<Expiry>)
where
    R: Clone,
{
    while let Some((slot, handle)) = expiry_rx.recv().await {
        let Some(debouncer) = core.upgrade() else {
            break;
        };
        debouncer.lock().on_expiry(slot, handle);
    }

    debug!("Debounce expiry pump stopped");
}
