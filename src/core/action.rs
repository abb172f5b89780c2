//! The `Action` marker trait for dispatchable values.
//!
//! Actions carry no required fields. The store never looks inside them; it
//! only moves them through the middleware chain to the reducer, which is
//! expected to match on them exhaustively.

use std::fmt::Debug;

/// Marker trait for values that can be dispatched to a store.
///
/// Actions are moved (never shared) through the middleware chain, possibly
/// across threads, so they must be `Send + 'static`. `Debug` is required for
/// diagnostics only.
///
/// # Example
///
/// ```rust
/// use unistore::core::Action;
///
/// #[derive(Debug)]
/// enum CounterAction {
///     Increment,
///     Add(i64),
/// }
///
/// impl Action for CounterAction {
///     fn name(&self) -> &str {
///         match self {
///             Self::Increment => "Increment",
///             Self::Add(_) => "Add",
///         }
///     }
/// }
///
/// assert_eq!(CounterAction::Add(2).name(), "Add");
/// ```
pub trait Action: Debug + Send + 'static {
    /// Short name of the action for logging.
    ///
    /// Default implementation returns the Rust type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    impl Action for Ping {}

    #[derive(Debug)]
    enum TestAction {
        Start,
        Append(String),
    }

    impl Action for TestAction {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Append(_) => "Append",
            }
        }
    }

    #[test]
    fn default_name_is_type_name() {
        assert!(Ping.name().ends_with("Ping"));
    }

    #[test]
    fn name_can_be_overridden_per_variant() {
        assert_eq!(TestAction::Start.name(), "Start");
        assert_eq!(TestAction::Append("x".to_string()).name(), "Append");
    }
}
