//! Subscription handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Identifier of a registration inside a store's subscriber registry.
///
/// Identifiers are never reused within a store, and they order
/// registrations by the time they were made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Registry side of a handle.
pub(crate) trait Unregister: Send + Sync {
    fn unregister(&self, id: SubscriptionId);
}

struct Gone;

impl Unregister for Gone {
    fn unregister(&self, _id: SubscriptionId) {}
}

/// Lifecycle handle of one subscription.
///
/// The handle only refers to the registry weakly, so it never keeps a
/// store alive. Dropping it disposes the subscription; call
/// [`Disposable::detach`] to keep the subscription for the lifetime of
/// the store instead.
///
/// # Example
///
/// ```rust
/// use unistore::core::{Action, Reducer};
/// use unistore::store::Store;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Debug)]
/// struct Add(i32);
///
/// impl Action for Add {}
///
/// let store = Store::new(0, Reducer::new(|a: &Add, s: i32| s + a.0), Vec::new());
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let handle = store.subscribe(move |s| sink.lock().unwrap().push(s));
///
/// store.dispatch(Add(1));
/// handle.dispose();
/// store.dispatch(Add(1));
///
/// assert!(handle.is_disposed());
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
/// ```
#[must_use = "dropping a Disposable cancels the subscription"]
pub struct Disposable {
    id: SubscriptionId,
    live: Arc<AtomicBool>,
    registry: Weak<dyn Unregister>,
    detached: bool,
}

impl Disposable {
    pub(crate) fn new(
        id: SubscriptionId,
        live: Arc<AtomicBool>,
        registry: Weak<dyn Unregister>,
    ) -> Self {
        Self {
            id,
            live,
            registry,
            detached: false,
        }
    }

    /// A handle that is already disposed.
    pub(crate) fn disposed() -> Self {
        let registry: Weak<dyn Unregister> = Weak::<Gone>::new();
        Self::new(
            SubscriptionId(u64::MAX),
            Arc::new(AtomicBool::new(false)),
            registry,
        )
    }

    /// Cancel future deliveries. Idempotent.
    ///
    /// Work already dispatched is not affected; a notification pass that
    /// has not yet reached this subscription will skip it.
    pub fn dispose(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            if let Some(registry) = self.registry.upgrade() {
                registry.unregister(self.id);
            }
        }
    }

    /// Whether the subscription no longer receives states.
    ///
    /// True after [`dispose`](Self::dispose), and also once the store is
    /// gone.
    pub fn is_disposed(&self) -> bool {
        !self.live.load(Ordering::SeqCst) || self.registry.strong_count() == 0
    }

    /// Identifier of the registration.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Release the handle without cancelling the subscription.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Disposable {
    fn drop(&mut self) {
        if !self.detached {
            self.dispose();
        }
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        removed: Mutex<Vec<SubscriptionId>>,
    }

    impl Unregister for Recording {
        fn unregister(&self, id: SubscriptionId) {
            self.removed.lock().unwrap().push(id);
        }
    }

    fn handle(registry: &Arc<Recording>, id: u64) -> Disposable {
        let weak: Weak<dyn Unregister> = Arc::downgrade(registry) as Weak<dyn Unregister>;
        Disposable::new(SubscriptionId(id), Arc::new(AtomicBool::new(true)), weak)
    }

    #[test]
    fn dispose_is_idempotent() {
        let registry = Arc::new(Recording {
            removed: Mutex::new(Vec::new()),
        });
        let disposable = handle(&registry, 1);

        assert!(!disposable.is_disposed());
        disposable.dispose();
        disposable.dispose();
        assert!(disposable.is_disposed());
        drop(disposable);

        assert_eq!(*registry.removed.lock().unwrap(), vec![SubscriptionId(1)]);
    }

    #[test]
    fn drop_disposes() {
        let registry = Arc::new(Recording {
            removed: Mutex::new(Vec::new()),
        });
        drop(handle(&registry, 7));
        assert_eq!(*registry.removed.lock().unwrap(), vec![SubscriptionId(7)]);
    }

    #[test]
    fn detach_keeps_registration() {
        let registry = Arc::new(Recording {
            removed: Mutex::new(Vec::new()),
        });
        handle(&registry, 3).detach();
        assert!(registry.removed.lock().unwrap().is_empty());
    }

    #[test]
    fn reports_disposed_once_registry_is_gone() {
        let registry = Arc::new(Recording {
            removed: Mutex::new(Vec::new()),
        });
        let disposable = handle(&registry, 2);
        drop(registry);

        assert!(disposable.is_disposed());
        disposable.dispose();
    }

    #[test]
    fn pre_disposed_handle() {
        let disposable = Disposable::disposed();
        assert!(disposable.is_disposed());
        disposable.dispose();
    }

    #[test]
    fn ids_display_and_order() {
        assert_eq!(SubscriptionId(4).to_string(), "sub-4");
        assert!(SubscriptionId(1) < SubscriptionId(2));
    }
}
