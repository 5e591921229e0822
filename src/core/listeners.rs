//! Multicast listener lists for fault and drained notifications

use super::error::{panic_message, SpoolerError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback for handler and control faults.
///
/// The first argument names the sender (the handler that faulted, or
/// `"spooler"` for control faults).
pub type FaultListener = Arc<dyn Fn(&str, &SpoolerError) + Send + Sync>;

/// Callback invoked each time the worker observes the queue empty
pub type DrainedListener = Arc<dyn Fn() + Send + Sync>;

/// Token returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

pub(crate) struct ListenerSet<F> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, F)>>,
}

impl<F: Clone> ListenerSet<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, listener: F) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Snapshot so listeners run without the lock held and may unsubscribe
    fn snapshot(&self) -> Vec<F> {
        self.listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    /// Invoke every current listener, containing panics per listener
    fn each(&self, kind: &str, mut call: impl FnMut(&F)) {
        for listener in self.snapshot() {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| call(&listener)));
            if let Err(panic_info) = result {
                log::error!(
                    "{} listener panicked: {}. Remaining listeners still notified.",
                    kind,
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }
}

impl ListenerSet<FaultListener> {
    /// Deliver a fault to all listeners; dropped when there are none
    pub(crate) fn notify(&self, sender: &str, fault: &SpoolerError) {
        self.each("Fault", |listener| listener(sender, fault));
    }
}

impl ListenerSet<DrainedListener> {
    pub(crate) fn notify(&self) {
        self.each("Drained", |listener| listener());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_notify() {
        let set: ListenerSet<DrainedListener> = ListenerSet::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            set.subscribe(Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        set.notify();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let set: ListenerSet<FaultListener> = ListenerSet::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let id = set.subscribe(Arc::new(move |_: &str, _: &SpoolerError| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        assert_eq!(set.len(), 0);

        set.notify("handler", &SpoolerError::other("ignored"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let set: ListenerSet<DrainedListener> = ListenerSet::new();
        let a = set.subscribe(Arc::new(|| {}));
        let b = set.subscribe(Arc::new(|| {}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_panicking_listener_is_contained() {
        let set: ListenerSet<FaultListener> = ListenerSet::new();
        let hits = Arc::new(AtomicUsize::new(0));

        set.subscribe(Arc::new(|_: &str, _: &SpoolerError| {
            panic!("listener failure")
        }));
        let hits_clone = Arc::clone(&hits);
        set.subscribe(Arc::new(move |sender: &str, fault: &SpoolerError| {
            assert_eq!(sender, "sink");
            assert!(fault.to_string().contains("disk full"));
            hits_clone.fetch_add(1, Ordering::SeqCst);
        }));

        set.notify("sink", &SpoolerError::other("disk full"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let set: Arc<ListenerSet<DrainedListener>> = Arc::new(ListenerSet::new());
        let slot = Arc::new(parking_lot::Mutex::new(None));

        let set_clone = Arc::clone(&set);
        let slot_clone = Arc::clone(&slot);
        let id = set.subscribe(Arc::new(move || {
            if let Some(id) = *slot_clone.lock() {
                set_clone.unsubscribe(id);
            }
        }));
        *slot.lock() = Some(id);

        set.notify();
        assert_eq!(set.len(), 0);
    }
}
