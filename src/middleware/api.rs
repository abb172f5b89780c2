//! The capabilities handed to every middleware factory.

use crate::core::Action;
use crate::store::StateCell;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Entry point of a store's composed chain.
pub(crate) trait Entry<A>: Send + Sync {
    fn enter(&self, action: A);
}

/// Stand-in entry for dispatchers that are not bound to a store.
struct Disconnected;

impl<A> Entry<A> for Disconnected {
    fn enter(&self, _action: A) {}
}

/// Read access to a store's current state.
///
/// Holds only the state slot, never the chain or the subscribers, so it
/// can be captured by middleware freely.
pub struct GetState<S> {
    cell: Arc<StateCell<S>>,
}

impl<S: Clone> GetState<S> {
    pub(crate) fn new(cell: Arc<StateCell<S>>) -> Self {
        Self { cell }
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> S {
        self.cell.get()
    }

    /// Read the current state without cloning it.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        self.cell.with(f)
    }
}

impl<S> Clone for GetState<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

/// Handle that sends actions through the top of a store's middleware chain.
///
/// The handle is weak: it never keeps the store alive. Dispatching after
/// the store has been dropped does nothing.
pub struct Dispatcher<A> {
    entry: Weak<dyn Entry<A>>,
}

impl<A: Action> Dispatcher<A> {
    pub(crate) fn new(entry: Weak<dyn Entry<A>>) -> Self {
        Self { entry }
    }

    /// A dispatcher that is not connected to any store.
    pub fn disconnected() -> Self {
        let entry: Weak<dyn Entry<A>> = Weak::<Disconnected>::new();
        Self { entry }
    }

    /// Dispatch an action through the whole chain, starting at the first
    /// middleware.
    pub fn dispatch(&self, action: A) {
        match self.entry.upgrade() {
            Some(entry) => entry.enter(action),
            None => {
                trace!(
                    target: "unistore::store",
                    action = action.name(),
                    "Store dropped, ignoring dispatch"
                );
            }
        }
    }

    /// Whether the store behind this dispatcher still exists.
    pub fn is_connected(&self) -> bool {
        self.entry.strong_count() > 0
    }
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            entry: Weak::clone(&self.entry),
        }
    }
}

/// The `(getState, dispatch)` pair given to each middleware factory.
pub struct MiddlewareApi<S, A> {
    get_state: GetState<S>,
    dispatcher: Dispatcher<A>,
}

impl<S: Clone, A: Action> MiddlewareApi<S, A> {
    pub(crate) fn new(get_state: GetState<S>, dispatcher: Dispatcher<A>) -> Self {
        Self {
            get_state,
            dispatcher,
        }
    }

    /// Snapshot of the store's current state.
    pub fn state(&self) -> S {
        self.get_state.get()
    }

    /// Re-dispatch from the top of the chain.
    pub fn dispatch(&self, action: A) {
        self.dispatcher.dispatch(action);
    }

    /// Owned state accessor, e.g. for moving into another thread.
    pub fn get_state(&self) -> GetState<S> {
        self.get_state.clone()
    }

    /// Owned dispatcher, e.g. for moving into another thread.
    pub fn dispatcher(&self) -> Dispatcher<A> {
        self.dispatcher.clone()
    }
}

impl<S, A> Clone for MiddlewareApi<S, A> {
    fn clone(&self) -> Self {
        Self {
            get_state: self.get_state.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}
