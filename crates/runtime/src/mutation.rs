//! Debounced async mutations
//!
//! Wraps an async operation returning `Result<T, E>` so that rapid calls
//! collapse into one execution, while every caller still gets an answer:
//! - the caller whose arguments were delivered gets the operation's result
//! - callers whose arguments were overwritten get `MutationError::Superseded`
//! - an outstanding caller pushed out by `cancel_pending` gets
//!   `MutationError::Cancelled`
//!
//! Cancelling never stops an operation that already started; it only
//! detaches the caller waiting on it.

use crate::debounced::Debounced;
use debounce_core::{DebounceError, DebouncePolicy, Result};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

/// Why a debounced mutation did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError<E> {
    /// Outstanding call was cancelled by a newer `cancel_pending` call
    #[error("mutation cancelled")]
    Cancelled,

    /// Call was dropped before delivery (overwritten or torn down)
    #[error("mutation superseded by a newer call")]
    Superseded,

    /// The operation itself failed
    #[error("mutation failed: {0}")]
    Failed(E),
}

/// Result of a debounced mutation
pub type MutationResult<T, E> = std::result::Result<T, MutationError<E>>;

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutateOptions {
    /// Cancel the outstanding call (and its pending delivery) first
    pub cancel_pending: bool,
}

impl MutateOptions {
    /// Options with `cancel_pending` set
    pub fn cancel_pending() -> Self {
        Self { cancel_pending: true }
    }
}

type Reply<T, E> = oneshot::Sender<MutationResult<T, E>>;
type ReplySlot<T, E> = Arc<Mutex<Option<Reply<T, E>>>>;

/// Debounced async mutation
///
/// Dropping it cancels any call not yet delivered.
pub struct DebouncedMutation<V, T, E> {
    debounced: Debounced<(V, ReplySlot<T, E>), ()>,

    /// Reply slot of the latest awaitable call, cleared once its operation finishes
    outstanding: Arc<Mutex<Option<ReplySlot<T, E>>>>,
}

impl<V, T, E> DebouncedMutation<V, T, E>
where
    V: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Debounce `op` on the current Tokio runtime
    pub fn new<F, Fut>(op: F, policy: DebouncePolicy) -> Result<Self>
    where
        F: Fn(V) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| DebounceError::NoRuntime)?;
        let outstanding: Arc<Mutex<Option<ReplySlot<T, E>>>> = Arc::new(Mutex::new(None));

        let deliver = {
            let outstanding = Arc::clone(&outstanding);
            let runtime = runtime.clone();
            move |(vars, reply): (V, ReplySlot<T, E>)| {
                let mutation = op(vars);
                let outstanding = Arc::clone(&outstanding);
                runtime.spawn(async move {
                    let result = mutation.await.map_err(MutationError::Failed);

                    let sender = reply.lock().take();
                    if let Some(sender) = sender {
                        // Caller may have stopped waiting
                        let _ = sender.send(result);
                    }

                    let mut current = outstanding.lock();
                    if current.as_ref().is_some_and(|slot| Arc::ptr_eq(slot, &reply)) {
                        *current = None;
                    }
                });
            }
        };

        Ok(Self {
            debounced: Debounced::with_handle(deliver, policy, runtime),
            outstanding,
        })
    }

    /// Submit a mutation without waiting for its result
    pub fn mutate(&self, vars: V, options: MutateOptions) {
        let previous = self.outstanding.lock().take();
        if options.cancel_pending {
            if let Some(previous) = previous {
                self.cancel_outstanding(previous);
            }
        }

        self.debounced.call((vars, Arc::new(Mutex::new(None))));
    }

    /// Submit a mutation and wait for its result
    ///
    /// The call is submitted before this returns; the future only waits
    /// for the answer.
    pub fn mutate_async(
        &self,
        vars: V,
        options: MutateOptions,
    ) -> impl Future<Output = MutationResult<T, E>> + Send + 'static {
        let (sender, receiver) = oneshot::channel();
        let reply: ReplySlot<T, E> = Arc::new(Mutex::new(Some(sender)));

        let previous = self.outstanding.lock().replace(Arc::clone(&reply));
        if options.cancel_pending {
            if let Some(previous) = previous {
                self.cancel_outstanding(previous);
            }
        }

        self.debounced.call((vars, reply));

        receiver.map(|answer| answer.unwrap_or(Err(MutationError::Superseded)))
    }

    /// Cancel the pending call and reject the outstanding caller
    pub fn cancel(&self) {
        let previous = self.outstanding.lock().take();
        match previous {
            Some(previous) => self.cancel_outstanding(previous),
            None => self.debounced.cancel(),
        }
    }

    /// Whether a call is waiting to be delivered
    pub fn is_pending(&self) -> bool {
        self.debounced.is_pending()
    }

    fn cancel_outstanding(&self, previous: ReplySlot<T, E>) {
        self.debounced.cancel();

        let sender = previous.lock().take();
        if let Some(sender) = sender {
            debug!("Cancelling outstanding debounced mutation");
            let _ = sender.send(Err(MutationError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn policy() -> DebouncePolicy {
        DebouncePolicy::new(ms(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutate_async_resolves_with_result() {
        let mutation = DebouncedMutation::new(|v: u32| async move { Ok::<_, String>(v * 2) }, policy()).unwrap();

        let result = mutation.mutate_async(21, MutateOptions::default()).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwritten_call_is_superseded() {
        let runs = Arc::new(AtomicUsize::new(0));
        let op = {
            let runs = Arc::clone(&runs);
            move |v: u32| {
                runs.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>(v) }
            }
        };
        let mutation = DebouncedMutation::new(op, policy()).unwrap();

        let first = mutation.mutate_async(1, MutateOptions::default());
        let second = mutation.mutate_async(2, MutateOptions::default());

        assert_eq!(first.await, Err(MutationError::Superseded));
        assert_eq!(second.await, Ok(2));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_rejects_outstanding_call() {
        let mutation = DebouncedMutation::new(|v: u32| async move { Ok::<_, String>(v) }, policy()).unwrap();

        let first = mutation.mutate_async(1, MutateOptions::default());
        let second = mutation.mutate_async(2, MutateOptions::cancel_pending());

        assert_eq!(first.await, Err(MutationError::Cancelled));
        assert_eq!(second.await, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_does_not_stop_running_operation() {
        let finished = Arc::new(AtomicUsize::new(0));
        let op = {
            let finished = Arc::clone(&finished);
            move |v: u32| {
                let finished = Arc::clone(&finished);
                async move {
                    sleep(ms(1000)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(v)
                }
            }
        };
        let mutation = DebouncedMutation::new(op, policy()).unwrap();

        let first = tokio::spawn(mutation.mutate_async(1, MutateOptions::default()));
        sleep(ms(150)).await;
        assert!(!mutation.is_pending());

        let second = mutation.mutate_async(2, MutateOptions::cancel_pending());

        assert_eq!(first.await.unwrap(), Err(MutationError::Cancelled));
        assert_eq!(second.await, Ok(2));
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_error_is_passed_through() {
        let mutation =
            DebouncedMutation::new(|_: u32| async move { Err::<u32, _>("boom".to_string()) }, policy()).unwrap();

        let result = mutation.mutate_async(1, MutateOptions::default()).await;
        assert_eq!(result, Err(MutationError::Failed("boom".to_string())));
        assert_eq!(result.unwrap_err().to_string(), "mutation failed: boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutate_coalesces_fire_and_forget_calls() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let op = {
            let seen = Arc::clone(&seen);
            move |v: u32| {
                seen.lock().push(v);
                async move { Ok::<_, String>(()) }
            }
        };
        let mutation = DebouncedMutation::new(op, policy()).unwrap();

        mutation.mutate(1, MutateOptions::default());
        mutation.mutate(2, MutateOptions::default());
        mutation.mutate(3, MutateOptions::default());
        sleep(ms(200)).await;

        assert_eq!(*seen.lock(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutate_with_cancel_pending_rejects_awaiting_caller() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let op = {
            let seen = Arc::clone(&seen);
            move |v: u32| {
                seen.lock().push(v);
                async move { Ok::<_, String>(v) }
            }
        };
        let mutation = DebouncedMutation::new(op, policy()).unwrap();

        let first = mutation.mutate_async(1, MutateOptions::default());
        mutation.mutate(2, MutateOptions::cancel_pending());

        assert_eq!(first.await, Err(MutationError::Cancelled));
        sleep(ms(200)).await;
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_rejects_and_drops_pending_call() {
        let runs = Arc::new(AtomicUsize::new(0));
        let op = {
            let runs = Arc::clone(&runs);
            move |v: u32| {
                runs.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, String>(v) }
            }
        };
        let mutation = DebouncedMutation::new(op, policy()).unwrap();

        let pending = mutation.mutate_async(1, MutateOptions::default());
        mutation.cancel();
        mutation.cancel();

        assert_eq!(pending.await, Err(MutationError::Cancelled));
        sleep(ms(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
