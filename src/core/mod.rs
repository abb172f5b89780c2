//! Pure core types.
//!
//! This module contains the side-effect free building blocks of a store:
//! - The `Action` marker trait for dispatchable values
//! - `Reducer`, the pure transition function, and its composition helpers
//!
//! Nothing in this module touches threads, locks or subscribers.

mod action;
mod reducer;

pub use action::Action;
pub use reducer::Reducer;
