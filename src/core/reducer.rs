//! Pure transition functions.
//!
//! A reducer maps `(action, state)` to the next state. Reducers are composed
//! by an ordered fold; the store never knows whether composition happened.

use super::action::Action;
use std::sync::Arc;

type ReduceFn<S, A> = dyn Fn(&A, S) -> S + Send + Sync;

/// Pure function that computes the next state from an action.
///
/// Cloning a `Reducer` is cheap; all clones share the same function.
///
/// # Example
///
/// ```rust
/// use unistore::core::{Action, Reducer};
///
/// #[derive(Debug)]
/// enum Op {
///     Inc,
///     Double,
/// }
///
/// impl Action for Op {}
///
/// let inc = Reducer::new(|action: &Op, state: i64| match action {
///     Op::Inc => state + 1,
///     Op::Double => state,
/// });
/// let double = Reducer::new(|action: &Op, state: i64| match action {
///     Op::Double => state * 2,
///     Op::Inc => state,
/// });
///
/// let both = inc.then(double);
/// assert_eq!(both.reduce(&Op::Inc, 1), 2);
/// assert_eq!(both.reduce(&Op::Double, 3), 6);
/// ```
pub struct Reducer<S, A> {
    reduce: Arc<ReduceFn<S, A>>,
}

impl<S: 'static, A: Action> Reducer<S, A> {
    /// Create a reducer from a pure function.
    ///
    /// The function must be deterministic and free of side effects, and
    /// thread-safe (`Send + Sync`).
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(&A, S) -> S + Send + Sync + 'static,
    {
        Self {
            reduce: Arc::new(reduce),
        }
    }

    /// Reducer that returns the state unchanged for every action.
    pub fn identity() -> Self {
        Self::new(|_, state| state)
    }

    /// Apply the reducer.
    pub fn reduce(&self, action: &A, state: S) -> S {
        (self.reduce)(action, state)
    }

    /// Run `self` and then `next` on its output.
    pub fn then(self, next: Reducer<S, A>) -> Self {
        Self::new(move |action, state| next.reduce(action, self.reduce(action, state)))
    }

    /// Fold a list of reducers into one, applied in list order.
    ///
    /// An empty list yields the identity reducer.
    pub fn combine<I>(reducers: I) -> Self
    where
        I: IntoIterator<Item = Reducer<S, A>>,
    {
        let reducers: Vec<Reducer<S, A>> = reducers.into_iter().collect();
        Self::new(move |action, state| {
            reducers
                .iter()
                .fold(state, |state, reducer| reducer.reduce(action, state))
        })
    }
}

impl<S, A> Clone for Reducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<S, A, F> From<F> for Reducer<S, A>
where
    S: 'static,
    A: Action,
    F: Fn(&A, S) -> S + Send + Sync + 'static,
{
    fn from(reduce: F) -> Self {
        Reducer::new(reduce)
    }
}
