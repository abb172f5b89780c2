//! Action interception between `dispatch` and the reducer.
//!
//! ```text
//! dispatch(action) → M1 → M2 → … → Mn → reducer → subscribers
//! ```
//!
//! # Key Concepts
//!
//! - **Middleware**: one of two shapes. `Full` middleware receive the
//!   continuation (`Next`) and may transform, delay, repeat or swallow an
//!   action. `FallThrough` middleware only observe; the original action is
//!   forwarded automatically.
//! - **MiddlewareApi**: the `(getState, dispatch)` pair given to every
//!   factory. Its `dispatch` re-enters the chain from the top.
//! - **Composition**: factories run once, in configured order, when the
//!   store is built. The first configured middleware is the outermost.

mod api;
mod chain;
mod logging;
mod stage;

pub(crate) use api::Entry;
pub(crate) use chain::compose;

pub use api::{Dispatcher, GetState, MiddlewareApi};
pub use logging::logging;
pub use stage::{Handler, Middleware, Next};
