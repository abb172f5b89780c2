//! Store error types.

use thiserror::Error;

/// Errors that can occur when registering a subscription.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubscribeError {
    #[error("skip_repeats requested but no equality is available for the state type")]
    MissingEquality,

    #[error("The store behind this stream has been dropped")]
    StoreDropped,
}

/// Errors that can occur when creating a delivery target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Failed to spawn delivery thread '{name}': {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
}
