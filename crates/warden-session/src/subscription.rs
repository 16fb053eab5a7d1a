//! Fan-out of session snapshots to consumers.
//!
//! Listeners are plain callbacks. The registry never holds its lock while
//! a listener runs, so a listener may read the manager, subscribe another
//! listener, or unsubscribe itself (or anyone else) from inside the call.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::SessionSnapshot;

pub(crate) type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// The set of registered listeners.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Subscribers {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.lock().iter().any(|(existing, _)| *existing == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Delivers `snapshot` to every listener registered when the call
    /// starts, skipping any that were unsubscribed along the way.
    ///
    /// A panicking listener is logged and skipped; it doesn't stop
    /// delivery to the others.
    pub(crate) fn notify(&self, snapshot: &SessionSnapshot) {
        let ids: Vec<u64> = self.lock().iter().map(|(id, _)| *id).collect();

        for id in ids {
            let listener = self
                .lock()
                .iter()
                .find(|(existing, _)| *existing == id)
                .map(|(_, listener)| Arc::clone(listener));

            let Some(listener) = listener else { continue };
            if panic::catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                tracing::error!(subscription = id, "session listener panicked");
            }
        }
    }

    // Listeners run outside the lock, so the list itself is never left
    // half-updated by a panic.
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle returned by [`SessionManager::subscribe`](crate::SessionManager::subscribe).
///
/// Dropping the handle does NOT unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). That keeps fire-and-forget
/// listeners (`let _ = manager.subscribe(..)`) alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Subscribers>,
}

impl Subscription {
    /// Stops delivery to this listener. Safe to call more than once, from
    /// inside a listener, or after the manager is gone.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                tracing::debug!(subscription = self.id, "listener unsubscribed");
            }
        }
    }

    /// `true` while the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Session, SessionStatus};
    use std::sync::atomic::AtomicUsize;

    fn snapshot() -> SessionSnapshot {
        Session::new().snapshot()
    }

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_: &SessionSnapshot| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn test_notify_reaches_every_listener_once() {
        let subs = Arc::new(Subscribers::default());
        let (a, la) = counter();
        let (b, lb) = counter();
        let _ha = subs.add(la);
        let _hb = subs.add(lb);

        subs.notify(&snapshot());

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let subs = Arc::new(Subscribers::default());
        let (count, listener) = counter();
        let handle = subs.add(listener);

        handle.unsubscribe();
        subs.notify(&snapshot());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
        assert_eq!(subs.len(), 0);
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let subs = Arc::new(Subscribers::default());
        let (_, listener) = counter();
        let handle = subs.add(listener);

        handle.unsubscribe();
        handle.unsubscribe();

        assert_eq!(subs.len(), 0);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped_is_noop() {
        let subs = Arc::new(Subscribers::default());
        let (_, listener) = counter();
        let handle = subs.add(listener);
        drop(subs);

        handle.unsubscribe();

        assert!(!handle.is_active());
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_notify() {
        let subs = Arc::new(Subscribers::default());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let (slot_in, calls_in) = (Arc::clone(&slot), Arc::clone(&calls));
        let handle = subs.add(Arc::new(move |_: &SessionSnapshot| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot_in.lock().unwrap().as_ref() {
                me.unsubscribe();
            }
        }));
        *slot.lock().unwrap() = Some(handle);

        subs.notify(&snapshot());
        subs.notify(&snapshot());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(subs.len(), 0);
    }

    #[test]
    fn test_listener_unsubscribed_by_earlier_listener_is_skipped() {
        let subs = Arc::new(Subscribers::default());
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let victim_in = Arc::clone(&victim);
        let _killer = subs.add(Arc::new(move |_: &SessionSnapshot| {
            if let Some(v) = victim_in.lock().unwrap().as_ref() {
                v.unsubscribe();
            }
        }));
        let (count, listener) = counter();
        *victim.lock().unwrap() = Some(subs.add(listener));

        subs.notify(&snapshot());

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let subs = Arc::new(Subscribers::default());
        fn buggy(_: &SessionSnapshot) {
            panic!("listener bug");
        }
        let _bad = subs.add(Arc::new(buggy));
        let (count, listener) = counter();
        let _good = subs.add(listener);

        subs.notify(&snapshot());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_receives_snapshot_contents() {
        let subs = Arc::new(Subscribers::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let _h = subs.add(Arc::new(move |s: &SessionSnapshot| {
            seen_in.lock().unwrap().push(s.status);
        }));

        subs.notify(&snapshot());

        assert_eq!(*seen.lock().unwrap(), vec![SessionStatus::Unauthenticated]);
    }
}
