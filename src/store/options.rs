//! Per-subscription options and the store-wide repeat policy.

use super::target::DeliveryTarget;
use std::sync::Arc;

/// Equality used by the distinct-until-changed filter.
pub type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// What to do when a subscription asks to skip repeats but no equality is
/// known for the state type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingEqualityPolicy {
    /// Disable the filter and deliver every state.
    #[default]
    DeliverAll,

    /// Refuse the subscription.
    Reject,
}

/// Options for [`Store::subscribe_with`](crate::store::Store::subscribe_with).
///
/// # Example
///
/// ```rust
/// use unistore::store::{SerialQueue, SubscribeOptions};
/// use std::sync::Arc;
///
/// let queue = Arc::new(SerialQueue::new("render").unwrap());
/// let options: SubscribeOptions<u32> = SubscribeOptions::new()
///     .on(Arc::clone(&queue))
///     .skip_repeats()
///     .starting_with_current();
/// ```
pub struct SubscribeOptions<S> {
    pub(crate) target: Option<Arc<dyn DeliveryTarget>>,
    pub(crate) skip_repeats: Option<bool>,
    pub(crate) equality: Option<Equality<S>>,
    pub(crate) emit_current: bool,
}

impl<S> SubscribeOptions<S> {
    /// Store defaults: default target, store-wide repeat setting, no
    /// initial delivery.
    pub fn new() -> Self {
        Self {
            target: None,
            skip_repeats: None,
            equality: None,
            emit_current: false,
        }
    }

    /// Deliver on `target` instead of the store's default target.
    pub fn on(mut self, target: impl DeliveryTarget + 'static) -> Self {
        self.target = Some(Arc::new(target));
        self
    }

    /// Deliver on an already shared target.
    pub fn on_shared(mut self, target: Arc<dyn DeliveryTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Turn the distinct filter on or off without supplying an equality.
    ///
    /// When turned on, the store-wide equality is used if one is
    /// configured; otherwise the store's [`MissingEqualityPolicy`] applies.
    pub fn with_skip_repeats(mut self, skip: bool) -> Self {
        self.skip_repeats = Some(skip);
        self
    }

    /// Skip states equal to the last delivered one, compared with `eq`.
    pub fn skip_repeats_by<F>(mut self, eq: F) -> Self
    where
        F: Fn(&S, &S) -> bool + Send + Sync + 'static,
    {
        self.skip_repeats = Some(true);
        self.equality = Some(Arc::new(eq));
        self
    }

    /// Deliver the current state right away, before any dispatch.
    pub fn starting_with_current(mut self) -> Self {
        self.emit_current = true;
        self
    }
}

impl<S: PartialEq + 'static> SubscribeOptions<S> {
    /// Skip states equal (`==`) to the last delivered one.
    pub fn skip_repeats(self) -> Self {
        self.skip_repeats_by(|a: &S, b: &S| a == b)
    }
}

impl<S> Default for SubscribeOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for SubscribeOptions<S> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            skip_repeats: self.skip_repeats,
            equality: self.equality.clone(),
            emit_current: self.emit_current,
        }
    }
}
