//! The store: state ownership, dispatch and subscription.

use super::cell::StateCell;
use super::disposable::Disposable;
use super::error::SubscribeError;
use super::options::{MissingEqualityPolicy, SubscribeOptions};
use super::registry::{Observer, Registry, RegistryConfig, Select, Selector};
use super::stream::StateStream;
use super::target::Immediate;
use crate::builder::StoreBuilder;
use crate::core::{Action, Reducer};
use crate::middleware::{compose, Dispatcher, Entry, GetState, Handler, Middleware, MiddlewareApi};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// A unidirectional state container.
///
/// State changes only by dispatching actions: each action runs through the
/// middleware chain, and whatever reaches the end of it is applied by the
/// reducer. Every resulting state is pushed to the live subscribers.
///
/// Cloning a `Store` is cheap; all clones share the same state, chain and
/// subscribers. Subscriptions, dispatchers and streams refer to the store
/// weakly, so dropping the last `Store` handle releases everything.
///
/// # Example
///
/// ```rust
/// use unistore::core::{Action, Reducer};
/// use unistore::middleware::logging;
/// use unistore::store::Store;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Debug)]
/// enum Counter {
///     Add(i64),
///     Reset,
/// }
///
/// impl Action for Counter {}
///
/// let reducer = Reducer::new(|action: &Counter, state: i64| match action {
///     Counter::Add(n) => state + n,
///     Counter::Reset => 0,
/// });
/// let store = Store::new(0, reducer, vec![logging()]);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _subscription = store.subscribe(move |state| sink.lock().unwrap().push(state));
///
/// store.dispatch(Counter::Add(2));
/// store.dispatch(Counter::Add(3));
/// store.dispatch(Counter::Reset);
///
/// assert_eq!(store.state(), 0);
/// assert_eq!(*seen.lock().unwrap(), vec![2, 5, 0]);
/// ```
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

/// A non-owning handle to a [`Store`].
pub struct WeakStore<S, A> {
    inner: Weak<StoreInner<S, A>>,
}

struct StoreInner<S, A> {
    chain: Handler<A>,
    core: Arc<Core<S, A>>,
}

/// Everything behind the terminal stage of the chain.
struct Core<S, A> {
    state: Arc<StateCell<S>>,
    reducer: Reducer<S, A>,
    registry: Arc<Registry<S>>,
}

impl<S, A> Core<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Apply `action` inside the serialized section.
    ///
    /// A thread that is already applying a transition for this store queues
    /// the action behind the current one instead of nesting.
    fn submit(self: &Arc<Self>, action: A) {
        let serial = self.registry.serial();
        if serial.is_held_here() {
            debug!(
                target: "unistore::store",
                action = action.name(),
                "Re-entrant dispatch, applying after current transition"
            );
            let core = Arc::clone(self);
            serial.defer(Box::new(move || core.transition(action)));
        } else {
            serial.run(|| self.transition(action));
        }
    }

    fn transition(&self, action: A) {
        let next = self.reducer.reduce(&action, self.state.get());
        self.state.replace(next.clone());
        trace!(target: "unistore::store", action = action.name(), "Applied");
        self.registry.notify(&next);
    }
}

impl<S, A> Entry<A> for StoreInner<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn enter(&self, action: A) {
        (self.chain)(action);
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Create a store with default settings.
    ///
    /// The middleware factories run here, once, in list order. Deliveries
    /// default to [`Immediate`] and repeats are not skipped unless a
    /// subscription asks for it.
    pub fn new(
        initial: S,
        reducer: impl Into<Reducer<S, A>>,
        middleware: Vec<Middleware<S, A>>,
    ) -> Self {
        Self::from_parts(
            initial,
            reducer.into(),
            middleware,
            RegistryConfig {
                default_target: Arc::new(Immediate),
                equality: None,
                automatically_skip_repeats: false,
                missing_equality: MissingEqualityPolicy::default(),
            },
        )
    }

    /// Start configuring a store.
    pub fn builder() -> StoreBuilder<S, A> {
        StoreBuilder::new()
    }

    pub(crate) fn from_parts(
        initial: S,
        reducer: Reducer<S, A>,
        middleware: Vec<Middleware<S, A>>,
        config: RegistryConfig<S>,
    ) -> Self {
        let state = Arc::new(StateCell::new(initial));
        let registry = Arc::new(Registry::new(Arc::clone(&state), config));
        let core = Arc::new(Core {
            state: Arc::clone(&state),
            reducer,
            registry,
        });
        let stages = middleware.len();

        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<S, A>>| {
            let entry: Weak<dyn Entry<A>> = weak.clone();
            let api = MiddlewareApi::new(GetState::new(state), Dispatcher::new(entry));

            let terminal_core = Arc::downgrade(&core);
            let terminal: Handler<A> = Arc::new(move |action: A| match terminal_core.upgrade() {
                Some(core) => core.submit(action),
                None => trace!(
                    target: "unistore::store",
                    action = action.name(),
                    "Store dropped, discarding action"
                ),
            });

            StoreInner {
                chain: compose(middleware, &api, terminal),
                core,
            }
        });

        debug!(target: "unistore::store", middleware = stages, "Store created");
        Self { inner }
    }

    /// Send an action through the middleware chain.
    pub fn dispatch(&self, action: A) {
        self.inner.enter(action);
    }

    /// A weak dispatch handle, e.g. for moving into another thread.
    pub fn dispatcher(&self) -> Dispatcher<A> {
        let weak = Arc::downgrade(&self.inner);
        let entry: Weak<dyn Entry<A>> = weak;
        Dispatcher::new(entry)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.core.state.get()
    }

    /// Read the current state without cloning it.
    ///
    /// `f` runs under the state's read lock. Do not dispatch from it, and
    /// do not subscribe with `starting_with_current` or call
    /// [`StateStream::receiver`] on such a stream: both wait for the store's
    /// transition section, and a transition waiting to write the state
    /// would then wait for this read in turn. Use [`Store::state`] when
    /// the closure needs to call back into the store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        self.inner.core.state.with(f)
    }

    /// Register `observer` for every subsequent state, with the store's
    /// default target and repeat setting.
    pub fn subscribe<F>(&self, observer: F) -> Disposable
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        self.subscribe_with(SubscribeOptions::new(), observer)
    }

    /// Register `observer` with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if repeats should be skipped, no equality is known and the
    /// store was built with [`MissingEqualityPolicy::Reject`]. Use
    /// [`try_subscribe_with`](Self::try_subscribe_with) to handle that case.
    pub fn subscribe_with<F>(&self, options: SubscribeOptions<S>, observer: F) -> Disposable
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        match self.try_subscribe_with(options, observer) {
            Ok(disposable) => disposable,
            Err(err) => panic!("{err}"),
        }
    }

    /// Register `observer` with explicit options, reporting a missing
    /// equality instead of panicking.
    pub fn try_subscribe_with<F>(
        &self,
        options: SubscribeOptions<S>,
        observer: F,
    ) -> Result<Disposable, SubscribeError>
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        let registry = &self.inner.core.registry;
        let config = registry.config();

        let skip = options
            .skip_repeats
            .unwrap_or(config.automatically_skip_repeats);
        let equality = options.equality.or_else(|| config.equality.clone());
        let equality = registry.resolve_equality(skip, equality)?;

        let select: Select<S, S> = Arc::new(|state: &S| state.clone());
        let observer: Observer<S> = Arc::new(observer);
        let sink = Selector::new(select, equality, observer);
        Ok(registry.register(options.target, Box::new(sink), options.emit_current))
    }

    /// A subscribable view of the state.
    pub fn observe(&self) -> StateStream<S> {
        let registry = &self.inner.core.registry;
        let config = registry.config();
        StateStream::new(
            Arc::downgrade(registry),
            config.automatically_skip_repeats,
            config
                .automatically_skip_repeats
                .then(|| config.equality.clone())
                .flatten(),
        )
    }

    pub fn downgrade(&self) -> WeakStore<S, A> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.core.registry.len()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A>
where
    S: Clone + Send + Sync + fmt::Debug + 'static,
    A: Action,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|state| {
            f.debug_struct("Store")
                .field("state", state)
                .field("subscribers", &self.subscriber_count())
                .finish()
        })
    }
}

impl<S, A> WeakStore<S, A> {
    /// The store, if any strong handle still exists.
    pub fn upgrade(&self) -> Option<Store<S, A>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<S, A> Clone for WeakStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
