//! Builder for constructing stores.

use crate::builder::error::BuildError;
use crate::core::{Action, Reducer};
use crate::middleware::Middleware;
use crate::store::{
    DeliveryTarget, Equality, Immediate, MissingEqualityPolicy, RegistryConfig, Store,
};
use std::sync::Arc;

/// Builder for constructing stores with a fluent API.
///
/// # Example
///
/// ```rust
/// use unistore::action_enum;
/// use unistore::core::Reducer;
/// use unistore::middleware::logging;
/// use unistore::store::{MissingEqualityPolicy, Store};
///
/// action_enum! {
///     pub enum Todo {
///         Add(String),
///         Clear,
///     }
/// }
///
/// let store = Store::builder()
///     .initial(Vec::<String>::new())
///     .reducer(Reducer::new(|action: &Todo, mut items: Vec<String>| {
///         match action {
///             Todo::Add(item) => items.push(item.clone()),
///             Todo::Clear => items.clear(),
///         }
///         items
///     }))
///     .middleware(logging())
///     .partial_eq()
///     .automatically_skip_repeats(true)
///     .on_missing_equality(MissingEqualityPolicy::Reject)
///     .build()
///     .unwrap();
///
/// store.dispatch(Todo::Add("milk".into()));
/// assert_eq!(store.state(), vec!["milk".to_string()]);
/// ```
pub struct StoreBuilder<S, A> {
    initial: Option<S>,
    reducer: Option<Reducer<S, A>>,
    middleware: Vec<Middleware<S, A>>,
    default_target: Option<Arc<dyn DeliveryTarget>>,
    equality: Option<Equality<S>>,
    automatically_skip_repeats: bool,
    missing_equality: MissingEqualityPolicy,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            reducer: None,
            middleware: Vec::new(),
            default_target: None,
            equality: None,
            automatically_skip_repeats: false,
            missing_equality: MissingEqualityPolicy::default(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the reducer (required). A later call replaces the earlier one;
    /// use [`Reducer::combine`] to apply several.
    pub fn reducer(mut self, reducer: impl Into<Reducer<S, A>>) -> Self {
        self.reducer = Some(reducer.into());
        self
    }

    /// Append a middleware. The first added is the outermost.
    pub fn middleware(mut self, middleware: Middleware<S, A>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Append multiple middleware at once, in order.
    pub fn middlewares(mut self, middleware: impl IntoIterator<Item = Middleware<S, A>>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    /// Target for subscriptions that do not name one. Defaults to
    /// [`Immediate`].
    pub fn default_target(mut self, target: impl DeliveryTarget + 'static) -> Self {
        self.default_target = Some(Arc::new(target));
        self
    }

    /// Store-wide equality for subscriptions that skip repeats without
    /// supplying their own.
    pub fn equality<F>(mut self, eq: F) -> Self
    where
        F: Fn(&S, &S) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Arc::new(eq));
        self
    }

    /// Skip repeats for subscriptions that do not say otherwise.
    pub fn automatically_skip_repeats(mut self, skip: bool) -> Self {
        self.automatically_skip_repeats = skip;
        self
    }

    /// What to do when repeats should be skipped but no equality is known.
    pub fn on_missing_equality(mut self, policy: MissingEqualityPolicy) -> Self {
        self.missing_equality = policy;
        self
    }

    /// Build the store. Middleware factories run here.
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<Store<S, A>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let reducer = self.reducer.ok_or(BuildError::MissingReducer)?;

        let config = RegistryConfig {
            default_target: self.default_target.unwrap_or_else(|| Arc::new(Immediate)),
            equality: self.equality,
            automatically_skip_repeats: self.automatically_skip_repeats,
            missing_equality: self.missing_equality,
        };

        Ok(Store::from_parts(initial, reducer, self.middleware, config))
    }
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Action,
{
    /// Use `==` as the store-wide equality.
    pub fn partial_eq(self) -> Self {
        self.equality(|a: &S, b: &S| a == b)
    }
}

impl<S, A> Default for StoreBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    fn default() -> Self {
        Self::new()
    }
}
