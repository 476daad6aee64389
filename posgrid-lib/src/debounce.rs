//! Cancellable debounce timer.
//!
//! Each [`Debouncer`] owns at most one pending payload. Scheduling replaces
//! the pending payload and restarts the timer, so a burst of changes produces
//! a single delivery of the last value.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Async consumer of a debounced payload.
pub type Sink<P> = Arc<dyn Fn(P) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<P> {
    /// Emptied by whoever delivers the payload first: the timer or `flush`.
    slot: Arc<Mutex<Option<P>>>,
    /// `None` when no runtime was available; the payload waits for `flush`.
    handle: Option<JoinHandle<()>>,
}

/// Trailing-edge debouncer backed by a tokio task.
///
/// Timers need a tokio runtime. Outside one, scheduled payloads are held
/// until [`Debouncer::flush`] instead of being delivered on a timer.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use futures::FutureExt;
/// use posgrid_lib::debounce::Debouncer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut debouncer = Debouncer::new(
///     Duration::from_millis(500),
///     Arc::new(|value: u32| async move { println!("saving {value}") }.boxed()),
/// );
/// debouncer.schedule(1);
/// debouncer.schedule(2);
/// debouncer.flush().await; // prints "saving 2"
/// # }
/// ```
pub struct Debouncer<P: Send + 'static> {
    delay: Duration,
    sink: Sink<P>,
    pending: Option<Pending<P>>,
}

impl<P: Send + 'static> Debouncer<P> {
    pub fn new(delay: Duration, sink: Sink<P>) -> Self {
        Self {
            delay,
            sink,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending payload and restart the timer.
    pub fn schedule(&mut self, payload: P) {
        self.cancel();

        let slot = Arc::new(Mutex::new(Some(payload)));
        let task_slot = Arc::clone(&slot);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;

        let handle = match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                let payload = task_slot.lock().ok().and_then(|mut guard| guard.take());
                if let Some(payload) = payload {
                    sink(payload).await;
                }
            })),
            Err(_) => {
                log::warn!("No tokio runtime; debounced payload waits for an explicit flush");
                None
            }
        };

        self.pending = Some(Pending { slot, handle });
    }

    /// Whether a payload is waiting for its timer.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|pending| {
            pending
                .slot
                .lock()
                .map(|guard| guard.is_some())
                .unwrap_or(false)
        })
    }

    /// Drop the pending payload without delivering it.
    ///
    /// A delivery that already started is left to finish. Returns true if a
    /// payload was discarded.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let discarded = pending
            .slot
            .lock()
            .ok()
            .and_then(|mut guard| guard.take())
            .is_some();
        if discarded && let Some(handle) = pending.handle {
            handle.abort();
        }
        discarded
    }

    /// Deliver the pending payload now instead of waiting for the timer.
    pub async fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let payload = pending.slot.lock().ok().and_then(|mut guard| guard.take());
        if let Some(payload) = payload {
            if let Some(handle) = pending.handle {
                handle.abort();
            }
            (self.sink)(payload).await;
        }
    }
}

impl<P: Send + 'static> Drop for Debouncer<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn recording() -> (Sink<u32>, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: Sink<u32> = Arc::new(move |value: u32| {
            let seen = Arc::clone(&sink_seen);
            async move {
                seen.lock().unwrap().push(value);
            }
            .boxed()
        });
        (sink, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces() {
        let (sink, seen) = recording();
        let mut debouncer = Debouncer::new(Duration::from_millis(500), sink);

        for value in 1..=5 {
            debouncer.schedule(value);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*seen.lock().unwrap(), [5]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards() {
        let (sink, seen) = recording();
        let mut debouncer = Debouncer::new(Duration::from_millis(500), sink);

        debouncer.schedule(1);
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_delivers_once() {
        let (sink, seen) = recording();
        let mut debouncer = Debouncer::new(Duration::from_millis(500), sink);

        debouncer.schedule(7);
        debouncer.flush().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*seen.lock().unwrap(), [7]);
    }

    #[test]
    fn test_schedule_without_runtime_waits_for_flush() {
        let (sink, seen) = recording();
        let mut debouncer = Debouncer::new(Duration::from_millis(500), sink);

        debouncer.schedule(4);
        debouncer.schedule(5);
        assert!(debouncer.is_pending());

        futures::executor::block_on(debouncer.flush());
        assert_eq!(*seen.lock().unwrap(), [5]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (sink, seen) = recording();
        {
            let mut debouncer = Debouncer::new(Duration::from_millis(500), sink);
            debouncer.schedule(3);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(seen.lock().unwrap().is_empty());
    }
}
