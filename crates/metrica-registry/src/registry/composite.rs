use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Fixed trailing-edge delay for composite subscriptions.
pub const COMPOSITE_DEBOUNCE: Duration = Duration::from_millis(25);

/// Trailing-edge debouncer: each `trigger` cancels the pending timer and
/// schedules a new one; only the last arguments of a burst are delivered.
pub(crate) struct Debouncer<A> {
    delay: Duration,
    rt: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
    callback: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub(crate) fn new(delay: Duration, rt: Handle, callback: Arc<dyn Fn(A) + Send + Sync>) -> Self {
        Self {
            delay,
            rt,
            pending: Mutex::new(None),
            callback,
        }
    }

    pub(crate) fn trigger(&self, args: A) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = pending.take() {
            prev.abort();
            tracing::trace!("debounce timer rescheduled");
        }

        let cb = Arc::clone(&self.callback);
        let delay = self.delay;
        *pending = Some(self.rt.spawn(async move {
            tokio::time::sleep(delay).await;
            cb(args);
        }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn burst_collapses_to_last_arguments() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let c = Arc::clone(&calls);
        let d: Debouncer<u32> = Debouncer::new(
            Duration::from_millis(20),
            Handle::current(),
            Arc::new(move |v: u32| c.lock().unwrap().push(v)),
        );

        d.trigger(1);
        d.trigger(2);
        d.trigger(3);
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(*calls.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn separated_triggers_fire_separately() {
        let n = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&n);
        let d: Debouncer<()> = Debouncer::new(
            Duration::from_millis(10),
            Handle::current(),
            Arc::new(move |_: ()| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        d.trigger(());
        tokio::time::sleep(Duration::from_millis(60)).await;
        d.trigger(());
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(n.load(Ordering::SeqCst), 2);
    }
}
