use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

/// Shared listener callback.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event-name keyed publish/subscribe channel:
/// - `event -> [(id, listener)...]`
/// - `id -> event` (reverse index for unsubscribe)
pub struct Publisher<E, P>
where
    E: Eq + Hash + Clone,
{
    listeners: DashMap<E, Vec<(SubscriptionId, Listener<P>)>>,
    index: DashMap<SubscriptionId, E>,
    seq: AtomicU64,
}

impl<E, P> Default for Publisher<E, P>
where
    E: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> Publisher<E, P>
where
    E: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            index: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, event: E, listener: F) -> SubscriptionId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.seq.fetch_add(1, Ordering::Relaxed));
        self.index.insert(id, event.clone());
        self.listeners
            .entry(event)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was unknown (already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some((_, event)) = self.index.remove(&id) else { return false; };
        if let Some(mut list) = self.listeners.get_mut(&event) {
            list.retain(|(sid, _)| *sid != id);
            if list.is_empty() {
                drop(list);
                self.listeners.remove_if(&event, |_, l| l.is_empty());
            }
        }
        true
    }

    /// Deliver `payload` to every listener of `event`, in subscription order.
    /// Returns the number of listeners invoked.
    ///
    /// Listeners are cloned out before delivery, so a listener may subscribe,
    /// unsubscribe, or publish again without deadlocking.
    pub fn publish(&self, event: &E, payload: &P) -> usize {
        let targets: Vec<Listener<P>> = self
            .listeners
            .get(event)
            .map(|l| l.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default();

        for f in &targets {
            f(payload);
        }
        targets.len()
    }

    pub fn listener_count(&self, event: &E) -> usize {
        self.listeners.get(event).map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn publish_reaches_only_matching_event() {
        let p: Publisher<&'static str, u32> = Publisher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        p.subscribe("a", move |v| s.lock().unwrap().push(("a", *v)));
        let s = Arc::clone(&seen);
        p.subscribe("b", move |v| s.lock().unwrap().push(("b", *v)));

        assert_eq!(p.publish(&"a", &1), 1);
        assert_eq!(p.publish(&"c", &2), 0);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 1)]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let p: Publisher<String, ()> = Publisher::new();
        let id = p.subscribe("k".to_string(), |_| {});
        assert_eq!(p.listener_count(&"k".to_string()), 1);
        assert!(p.unsubscribe(id));
        assert!(!p.unsubscribe(id));
        assert_eq!(p.publish(&"k".to_string(), &()), 0);
    }

    #[test]
    fn listener_may_publish_reentrantly() {
        let p: Arc<Publisher<u8, u8>> = Arc::new(Publisher::new());
        let hits = Arc::new(Mutex::new(0));

        let inner = Arc::clone(&p);
        p.subscribe(1, move |v| {
            inner.publish(&2, v);
        });
        let h = Arc::clone(&hits);
        p.subscribe(2, move |_| *h.lock().unwrap() += 1);

        p.publish(&1, &9);
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
