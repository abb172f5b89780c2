//! Subscriber registry: registration, notification and disposal.

use super::cell::StateCell;
use super::disposable::{Disposable, SubscriptionId, Unregister};
use super::error::SubscribeError;
use super::options::{Equality, MissingEqualityPolicy};
use super::serial::{self, Serial};
use super::target::{DeliveryTarget, Job};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace, warn};

/// Observer callback of one subscription.
pub(crate) type Observer<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Projection from the store state to what a subscription receives.
pub(crate) type Select<S, T> = Arc<dyn Fn(&S) -> T + Send + Sync>;

/// Decides, per state, whether a subscription gets a delivery.
pub(crate) trait Sink<S>: Send {
    fn offer(&mut self, state: &S, live: &Arc<AtomicBool>) -> Option<Job>;
}

/// Projects the state, filters repeats, and packages the observer call.
pub(crate) struct Selector<S, T> {
    select: Select<S, T>,
    equality: Option<Equality<T>>,
    last: Option<T>,
    observer: Observer<T>,
}

impl<S, T> Selector<S, T> {
    pub(crate) fn new(
        select: Select<S, T>,
        equality: Option<Equality<T>>,
        observer: Observer<T>,
    ) -> Self {
        Self {
            select,
            equality,
            last: None,
            observer,
        }
    }
}

impl<S, T> Sink<S> for Selector<S, T>
where
    T: Clone + Send + 'static,
{
    fn offer(&mut self, state: &S, live: &Arc<AtomicBool>) -> Option<Job> {
        let value = (self.select)(state);

        if let Some(equality) = &self.equality {
            let repeated = matches!(&self.last, Some(last) if equality(last, &value));
            if repeated {
                return None;
            }
            self.last = Some(value.clone());
        }

        let observer = Arc::clone(&self.observer);
        let live = Arc::clone(live);
        Some(Box::new(move || {
            if live.load(Ordering::SeqCst) {
                observer(value);
            }
        }))
    }
}

/// One registration.
pub(crate) struct Subscription<S> {
    live: Arc<AtomicBool>,
    target: Arc<dyn DeliveryTarget>,
    sink: Mutex<Box<dyn Sink<S>>>,
}

impl<S> Subscription<S> {
    fn offer(&self, state: &S) {
        if !self.live.load(Ordering::SeqCst) {
            return;
        }
        let job = self
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .offer(state, &self.live);
        if let Some(job) = job {
            self.target.deliver(job);
        }
    }
}

/// Store-wide subscription settings.
pub(crate) struct RegistryConfig<S> {
    pub(crate) default_target: Arc<dyn DeliveryTarget>,
    pub(crate) equality: Option<Equality<S>>,
    pub(crate) automatically_skip_repeats: bool,
    pub(crate) missing_equality: MissingEqualityPolicy,
}

/// Ordered set of live subscriptions plus the store's serialization point.
///
/// Records are keyed by a monotonically increasing id, so iteration order
/// is registration order.
pub(crate) struct Registry<S> {
    entries: Mutex<BTreeMap<SubscriptionId, Arc<Subscription<S>>>>,
    next_id: AtomicU64,
    state: Arc<StateCell<S>>,
    serial: Serial,
    config: RegistryConfig<S>,
}

impl<S> Registry<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(state: Arc<StateCell<S>>, config: RegistryConfig<S>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            state,
            serial: Serial::new(),
            config,
        }
    }

    pub(crate) fn serial(&self) -> &Serial {
        &self.serial
    }

    pub(crate) fn config(&self) -> &RegistryConfig<S> {
        &self.config
    }

    /// Add a subscription at the end of the notification order.
    ///
    /// With `emit_current`, the current state is offered inside the
    /// serialized section, so it cannot overtake a concurrent transition.
    pub(crate) fn register(
        self: &Arc<Self>,
        target: Option<Arc<dyn DeliveryTarget>>,
        sink: Box<dyn Sink<S>>,
        emit_current: bool,
    ) -> Disposable {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let live = Arc::new(AtomicBool::new(true));
        let subscription = Arc::new(Subscription {
            live: Arc::clone(&live),
            target: target.unwrap_or_else(|| Arc::clone(&self.config.default_target)),
            sink: Mutex::new(sink),
        });

        let insert = || {
            self.lock_entries().insert(id, Arc::clone(&subscription));
            if emit_current {
                let current = self.state.get();
                subscription.offer(&current);
            }
        };
        if emit_current && !self.serial.is_held_here() {
            self.serial.run(insert);
        } else {
            insert();
        }

        trace!(target: "unistore::registry", %id, "Subscribed");
        let weak = Arc::downgrade(self);
        let registry: Weak<dyn Unregister> = weak;
        Disposable::new(id, live, registry)
    }

    /// Offer `state` to every subscription registered when the pass starts.
    ///
    /// Callers hold the serialized section.
    pub(crate) fn notify(&self, state: &S) {
        let snapshot: Vec<Arc<Subscription<S>>> =
            self.lock_entries().values().cloned().collect();
        for subscription in &snapshot {
            subscription.offer(state);
        }
        // May hold the last handle to a subscription disposed during the pass.
        serial::retire(snapshot);
    }

    /// Settle the distinct filter of a new subscription.
    ///
    /// `skip` says whether repeats should be skipped; `equality` is the
    /// comparison found for the delivered type, if any.
    pub(crate) fn resolve_equality<T>(
        &self,
        skip: bool,
        equality: Option<Equality<T>>,
    ) -> Result<Option<Equality<T>>, SubscribeError> {
        if !skip {
            return Ok(None);
        }
        match (equality, self.config.missing_equality) {
            (Some(equality), _) => Ok(Some(equality)),
            (None, MissingEqualityPolicy::DeliverAll) => {
                debug!(
                    target: "unistore::registry",
                    "skip_repeats requested without an equality, delivering every state"
                );
                Ok(None)
            }
            (None, MissingEqualityPolicy::Reject) => {
                warn!(
                    target: "unistore::registry",
                    "skip_repeats requested without an equality, rejecting subscription"
                );
                Err(SubscribeError::MissingEquality)
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock_entries().len()
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<SubscriptionId, Arc<Subscription<S>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> Unregister for Registry<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn unregister(&self, id: SubscriptionId) {
        // Released outside both the entry lock and the serial section: a
        // target's teardown may wait on observers that dispatch.
        let removed = self.lock_entries().remove(&id);
        if let Some(removed) = removed {
            trace!(target: "unistore::registry", %id, "Disposed");
            serial::retire(removed);
        }
    }
}
