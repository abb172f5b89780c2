//! Middleware records and continuations.

use super::api::MiddlewareApi;
use crate::core::Action;
use std::sync::Arc;

/// A per-action handler: one stage of a composed chain.
pub type Handler<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Binds a prepared middleware to the continuation for the rest of the chain.
pub(crate) type Wrap<A> = Box<dyn FnOnce(Next<A>) -> Handler<A>>;

type FullFactory<S, A> = Box<dyn FnOnce(MiddlewareApi<S, A>) -> Wrap<A>>;
type FallThroughFactory<S, A> =
    Box<dyn FnOnce(MiddlewareApi<S, A>) -> Box<dyn Fn(&A) + Send + Sync>>;

/// Continuation for the remainder of a middleware chain.
///
/// Calling it hands the action to the next stage (or to the reducer for
/// the last middleware). It may be called from any thread, later, more
/// than once, or not at all.
pub struct Next<A> {
    handler: Handler<A>,
}

impl<A: Action> Next<A> {
    pub(crate) fn new(handler: Handler<A>) -> Self {
        Self { handler }
    }

    /// Pass an action to the next stage.
    pub fn call(&self, action: A) {
        (self.handler)(action);
    }
}

impl<A> Clone for Next<A> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

/// One entry of a store's middleware list.
///
/// Both shapes are factories that run exactly once, when the store is
/// built. What they return runs once per action reaching the stage.
pub enum Middleware<S, A> {
    /// `(getState, dispatch) -> next -> (action -> ())`.
    ///
    /// The handler decides per action whether, when and with what to call
    /// `next`.
    Full(FullFactory<S, A>),

    /// `(getState, dispatch) -> (action -> ())`.
    ///
    /// The handler only observes; the original action is always forwarded
    /// once it returns.
    FallThrough(FallThroughFactory<S, A>),
}

impl<S: Clone + 'static, A: Action> Middleware<S, A> {
    /// Create a middleware that controls its continuation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unistore::core::Action;
    /// use unistore::middleware::{Middleware, Next};
    ///
    /// #[derive(Debug)]
    /// enum Msg {
    ///     Keep(u32),
    ///     Drop,
    /// }
    ///
    /// impl Action for Msg {}
    ///
    /// // Swallows `Drop` actions and doubles the payload of `Keep`.
    /// let filter: Middleware<u32, Msg> = Middleware::full(|_api| {
    ///     |next: Next<Msg>| {
    ///         move |action: Msg| match action {
    ///             Msg::Keep(n) => next.call(Msg::Keep(n * 2)),
    ///             Msg::Drop => {}
    ///         }
    ///     }
    /// });
    /// ```
    pub fn full<F, W, H>(factory: F) -> Self
    where
        F: FnOnce(MiddlewareApi<S, A>) -> W + 'static,
        W: FnOnce(Next<A>) -> H + 'static,
        H: Fn(A) + Send + Sync + 'static,
    {
        let factory: FullFactory<S, A> = Box::new(move |api: MiddlewareApi<S, A>| {
            let bind = factory(api);
            let wrap: Wrap<A> = Box::new(move |next: Next<A>| {
                let handler: Handler<A> = Arc::new(bind(next));
                handler
            });
            wrap
        });
        Middleware::Full(factory)
    }

    /// Create a side-effect-only middleware.
    ///
    /// # Example
    ///
    /// ```rust
    /// use unistore::core::Action;
    /// use unistore::middleware::Middleware;
    ///
    /// #[derive(Debug)]
    /// struct Tick;
    ///
    /// impl Action for Tick {}
    ///
    /// let audit: Middleware<u64, Tick> = Middleware::fall_through(|api| {
    ///     move |action: &Tick| println!("{:?} at state {}", action, api.state())
    /// });
    /// ```
    pub fn fall_through<F, H>(factory: F) -> Self
    where
        F: FnOnce(MiddlewareApi<S, A>) -> H + 'static,
        H: Fn(&A) + Send + Sync + 'static,
    {
        let factory: FallThroughFactory<S, A> = Box::new(move |api: MiddlewareApi<S, A>| {
            let observe: Box<dyn Fn(&A) + Send + Sync> = Box::new(factory(api));
            observe
        });
        Middleware::FallThrough(factory)
    }

    /// Run the factory, leaving only the `next` binding to do.
    pub(crate) fn prepare(self, api: MiddlewareApi<S, A>) -> Wrap<A> {
        match self {
            Middleware::Full(factory) => factory(api),
            Middleware::FallThrough(factory) => {
                let observe = factory(api);
                Box::new(move |next: Next<A>| -> Handler<A> {
                    Arc::new(move |action: A| {
                        observe(&action);
                        next.call(action);
                    })
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::api::{Dispatcher, GetState};
    use crate::store::StateCell;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Value(u32),
        Skip,
    }

    impl Action for TestAction {}

    fn api() -> MiddlewareApi<u32, TestAction> {
        MiddlewareApi::new(
            GetState::new(Arc::new(StateCell::new(0))),
            Dispatcher::disconnected(),
        )
    }

    fn recording_next(log: &Arc<Mutex<Vec<TestAction>>>) -> Next<TestAction> {
        let log = Arc::clone(log);
        Next::new(Arc::new(move |action: TestAction| {
            log.lock().unwrap().push(action)
        }))
    }

    #[test]
    fn full_middleware_can_transform_and_swallow() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middleware: Middleware<u32, TestAction> = Middleware::full(|_api| {
            |next: Next<TestAction>| {
                move |action: TestAction| match action {
                    TestAction::Value(v) => next.call(TestAction::Value(v + 10)),
                    TestAction::Skip => {}
                }
            }
        });

        let handler = (middleware.prepare(api()))(recording_next(&log));
        handler(TestAction::Value(1));
        handler(TestAction::Skip);

        assert_eq!(*log.lock().unwrap(), vec![TestAction::Value(11)]);
    }

    #[test]
    fn full_middleware_can_call_next_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middleware: Middleware<u32, TestAction> = Middleware::full(|_api| {
            |next: Next<TestAction>| {
                move |action: TestAction| {
                    next.call(action.clone());
                    next.call(action);
                }
            }
        });

        let handler = (middleware.prepare(api()))(recording_next(&log));
        handler(TestAction::Value(3));

        assert_eq!(
            *log.lock().unwrap(),
            vec![TestAction::Value(3), TestAction::Value(3)]
        );
    }

    #[test]
    fn fall_through_forwards_original_action() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let middleware: Middleware<u32, TestAction> = Middleware::fall_through(move |_api| {
            move |action: &TestAction| seen_clone.lock().unwrap().push(action.clone())
        });

        let handler = (middleware.prepare(api()))(recording_next(&log));
        handler(TestAction::Skip);
        handler(TestAction::Value(5));

        let expected = vec![TestAction::Skip, TestAction::Value(5)];
        assert_eq!(*seen.lock().unwrap(), expected);
        assert_eq!(*log.lock().unwrap(), expected);
    }

    #[test]
    fn factory_runs_when_prepared_not_per_action() {
        let runs = Arc::new(Mutex::new(0));
        let runs_clone = Arc::clone(&runs);
        let middleware: Middleware<u32, TestAction> = Middleware::fall_through(move |_api| {
            *runs_clone.lock().unwrap() += 1;
            |_action: &TestAction| {}
        });

        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = (middleware.prepare(api()))(recording_next(&log));
        for i in 0..5 {
            handler(TestAction::Value(i));
        }

        assert_eq!(*runs.lock().unwrap(), 1);
        assert_eq!(log.lock().unwrap().len(), 5);
    }
}
