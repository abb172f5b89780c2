//! Restartable, subscribable views of a store's state.

use super::disposable::Disposable;
use super::error::SubscribeError;
use super::options::Equality;
use super::registry::{Observer, Registry, Select, Selector};
use super::target::DeliveryTarget;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryIter, TryRecvError};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::trace;

/// A view of a store's state returned by [`Store::observe`](crate::store::Store::observe).
///
/// A stream is only a description: nothing is registered until
/// [`subscribe`](Self::subscribe) or [`receiver`](Self::receiver) is
/// called, and every call creates an independent registration. The
/// stream refers to the store weakly.
///
/// # Example
///
/// ```rust
/// use unistore::core::{Action, Reducer};
/// use unistore::store::Store;
///
/// #[derive(Debug)]
/// struct Rename(&'static str);
///
/// impl Action for Rename {}
///
/// #[derive(Clone)]
/// struct Profile {
///     name: &'static str,
///     visits: u32,
/// }
///
/// let store = Store::new(
///     Profile { name: "ada", visits: 0 },
///     Reducer::new(|a: &Rename, s: Profile| Profile { name: a.0, ..s }),
///     Vec::new(),
/// );
///
/// let names = store
///     .observe()
///     .select(|p| p.name)
///     .skip_repeats()
///     .starting_with_current()
///     .receiver();
///
/// store.dispatch(Rename("ada"));
/// store.dispatch(Rename("grace"));
///
/// assert_eq!(names.try_iter().collect::<Vec<_>>(), vec!["ada", "grace"]);
/// ```
pub struct StateStream<S, T = S> {
    registry: Weak<Registry<S>>,
    select: Select<S, T>,
    target: Option<Arc<dyn DeliveryTarget>>,
    equality: Option<Equality<T>>,
    skip_requested: bool,
    emit_current: bool,
}

impl<S> StateStream<S, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        registry: Weak<Registry<S>>,
        skip_requested: bool,
        equality: Option<Equality<S>>,
    ) -> Self {
        Self {
            registry,
            select: Arc::new(|state: &S| state.clone()),
            target: None,
            equality,
            skip_requested,
            emit_current: false,
        }
    }
}

impl<S, T> StateStream<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// Project every state to a sub-state.
    ///
    /// Repeat filtering set up before the projection does not carry over;
    /// call [`skip_repeats`](Self::skip_repeats) on the projected stream.
    pub fn select<U, F>(self, f: F) -> StateStream<S, U>
    where
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let inner = self.select;
        StateStream {
            registry: self.registry,
            select: Arc::new(move |state: &S| f(&inner(state))),
            target: self.target,
            equality: None,
            skip_requested: false,
            emit_current: self.emit_current,
        }
    }

    /// Deliver on `target` instead of the store's default target.
    pub fn on(mut self, target: impl DeliveryTarget + 'static) -> Self {
        self.target = Some(Arc::new(target));
        self
    }

    /// Skip values equal to the last delivered one, compared with `eq`.
    pub fn skip_repeats_by<F>(mut self, eq: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.skip_requested = true;
        self.equality = Some(Arc::new(eq));
        self
    }

    /// Deliver the current value right away on each subscription.
    ///
    /// Seeding reads the state inside the store's transition section, so
    /// such a stream must not be subscribed from within
    /// [`Store::read`](crate::store::Store::read).
    pub fn starting_with_current(mut self) -> Self {
        self.emit_current = true;
        self
    }

    /// Register `observer`.
    ///
    /// Fails if the store is gone, or if repeats should be skipped and the
    /// store rejects subscriptions without an equality.
    pub fn try_subscribe<F>(&self, observer: F) -> Result<Disposable, SubscribeError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let registry = self
            .registry
            .upgrade()
            .ok_or(SubscribeError::StoreDropped)?;
        let equality = registry.resolve_equality(self.skip_requested, self.equality.clone())?;
        let observer: Observer<T> = Arc::new(observer);
        let sink = Selector::new(Arc::clone(&self.select), equality, observer);
        Ok(registry.register(self.target.clone(), Box::new(sink), self.emit_current))
    }

    /// Register `observer`, returning an already disposed handle if the
    /// store is gone.
    ///
    /// # Panics
    ///
    /// Panics if repeats should be skipped, no equality is known and the
    /// store was built with [`MissingEqualityPolicy::Reject`](crate::store::MissingEqualityPolicy::Reject).
    pub fn subscribe<F>(&self, observer: F) -> Disposable
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        match self.try_subscribe(observer) {
            Ok(disposable) => disposable,
            Err(SubscribeError::StoreDropped) => {
                trace!(target: "unistore::registry", "Store dropped, returning disposed handle");
                Disposable::disposed()
            }
            Err(err) => panic!("{err}"),
        }
    }

    /// Subscribe with a channel and return its receiving end.
    ///
    /// The receiver ends once the store is dropped and every queued value
    /// has been received. With `starting_with_current` this subscribes
    /// under the transition section, so do not call it inside
    /// [`Store::read`](crate::store::Store::read).
    pub fn receiver(&self) -> StateReceiver<T> {
        let (sender, receiver) = mpsc::channel();
        let disposable = self.subscribe(move |value| {
            let _ = sender.send(value);
        });
        StateReceiver {
            receiver,
            _disposable: disposable,
        }
    }
}

impl<S, T> StateStream<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Clone + PartialEq + Send + 'static,
{
    /// Skip values equal (`==`) to the last delivered one.
    pub fn skip_repeats(self) -> Self {
        self.skip_repeats_by(|a: &T, b: &T| a == b)
    }
}

impl<S, T> Clone for StateStream<S, T> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
            select: Arc::clone(&self.select),
            target: self.target.clone(),
            equality: self.equality.clone(),
            skip_requested: self.skip_requested,
            emit_current: self.emit_current,
        }
    }
}

/// Blocking, channel-backed subscription created by [`StateStream::receiver`].
///
/// Dropping the receiver disposes the subscription.
pub struct StateReceiver<T> {
    receiver: Receiver<T>,
    _disposable: Disposable,
}

impl<T> StateReceiver<T> {
    /// Wait for the next value. `None` once the store is gone.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Values already delivered, without blocking.
    pub fn try_iter(&self) -> TryIter<'_, T> {
        self.receiver.try_iter()
    }
}

impl<T> Iterator for StateReceiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cell::StateCell;
    use crate::store::options::MissingEqualityPolicy;
    use crate::store::registry::RegistryConfig;
    use crate::store::target::Immediate;
    use std::sync::Mutex;

    fn registry(policy: MissingEqualityPolicy) -> Arc<Registry<(i32, i32)>> {
        Arc::new(Registry::new(
            Arc::new(StateCell::new((0, 0))),
            RegistryConfig {
                default_target: Arc::new(Immediate),
                equality: None,
                automatically_skip_repeats: false,
                missing_equality: policy,
            },
        ))
    }

    fn push(registry: &Registry<(i32, i32)>, states: &[(i32, i32)]) {
        for state in states {
            registry.serial().run(|| registry.notify(state));
        }
    }

    #[test]
    fn select_projects_and_filters_sub_state() {
        let registry = registry(MissingEqualityPolicy::DeliverAll);
        let stream = StateStream::new(Arc::downgrade(&registry), false, None);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = stream
            .select(|s: &(i32, i32)| s.0)
            .skip_repeats()
            .subscribe(move |v| sink.lock().unwrap().push(v));

        push(&registry, &[(1, 0), (1, 1), (2, 1), (2, 2), (1, 2)]);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn each_subscribe_is_independent() {
        let registry = registry(MissingEqualityPolicy::DeliverAll);
        let stream = StateStream::new(Arc::downgrade(&registry), false, None).select(|s| s.1);

        let first = stream.receiver();
        let second = stream.clone().skip_repeats().receiver();
        assert_eq!(registry.len(), 2);

        push(&registry, &[(0, 1), (0, 1), (0, 2)]);

        assert_eq!(first.try_iter().collect::<Vec<_>>(), vec![1, 1, 2]);
        assert_eq!(second.try_iter().collect::<Vec<_>>(), vec![1, 2]);

        drop(first);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn starting_with_current_emits_on_subscribe() {
        let registry = registry(MissingEqualityPolicy::DeliverAll);
        let values = StateStream::new(Arc::downgrade(&registry), false, None)
            .starting_with_current()
            .receiver();

        assert_eq!(values.try_recv().unwrap(), (0, 0));
    }

    #[test]
    fn automatic_skip_without_equality_follows_policy() {
        let strict = registry(MissingEqualityPolicy::Reject);
        let stream = StateStream::new(Arc::downgrade(&strict), true, None);
        assert_eq!(
            stream.try_subscribe(|_| {}).err(),
            Some(SubscribeError::MissingEquality)
        );

        // A projection drops the inherited request.
        assert!(stream.select(|s| s.0).try_subscribe(|_| {}).is_ok());
    }

    #[test]
    fn dropped_store_yields_disposed_handles() {
        let registry = registry(MissingEqualityPolicy::DeliverAll);
        let stream = StateStream::new(Arc::downgrade(&registry), false, None);
        let receiver = stream.receiver();
        drop(registry);

        assert_eq!(
            stream.try_subscribe(|_| {}).err(),
            Some(SubscribeError::StoreDropped)
        );
        assert!(stream.subscribe(|_| {}).is_disposed());
        assert_eq!(receiver.recv(), None);
    }
}
