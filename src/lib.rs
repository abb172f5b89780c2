//! Unistore: a unidirectional state container
//!
//! A store owns one state value. The only way to change it is to dispatch
//! an action: the action passes through a chain of middleware, and the
//! pure reducer turns whatever reaches the end into the next state. Every
//! new state is then pushed to the subscribers, each on its own delivery
//! target.
//!
//! # Core Concepts
//!
//! - **Reducer**: pure `(action, state) -> state` function, composed by an
//!   ordered fold
//! - **Middleware**: intercepts actions before the reducer; may transform,
//!   delay, repeat or swallow them, and may continue from another thread
//! - **Store**: serializes "apply reducer + notify" so transitions happen
//!   in one total order, whatever thread they arrive from
//! - **Subscriptions**: per-subscriber delivery target and optional
//!   distinct-until-changed filter, released through a `Disposable`
//!
//! # Example
//!
//! ```rust
//! use unistore::action_enum;
//! use unistore::core::Reducer;
//! use unistore::middleware::{Middleware, Next};
//! use unistore::store::{Store, SubscribeOptions};
//! use std::sync::{Arc, Mutex};
//!
//! action_enum! {
//!     enum Cart {
//!         Add(u32),
//!         AddTwice(u32),
//!         Clear,
//!     }
//! }
//!
//! // Expands `AddTwice` into two `Add` actions at the top of the chain.
//! let expand: Middleware<u32, Cart> = Middleware::full(|api| {
//!     move |next: Next<Cart>| {
//!         move |action: Cart| match action {
//!             Cart::AddTwice(n) => {
//!                 api.dispatch(Cart::Add(n));
//!                 api.dispatch(Cart::Add(n));
//!             }
//!             other => next.call(other),
//!         }
//!     }
//! });
//!
//! let store = Store::new(
//!     0,
//!     Reducer::new(|action: &Cart, total: u32| match action {
//!         Cart::Add(n) => total + n,
//!         Cart::AddTwice(_) => total,
//!         Cart::Clear => 0,
//!     }),
//!     vec![expand],
//! );
//!
//! let totals = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&totals);
//! let _subscription = store.subscribe_with(
//!     SubscribeOptions::new().skip_repeats(),
//!     move |total| sink.lock().unwrap().push(total),
//! );
//!
//! store.dispatch(Cart::AddTwice(5));
//! store.dispatch(Cart::Clear);
//! store.dispatch(Cart::Clear);
//!
//! assert_eq!(*totals.lock().unwrap(), vec![5, 10, 0]);
//! ```

pub mod builder;
pub mod core;
pub mod middleware;
pub mod store;

// Re-export commonly used types
pub use crate::core::{Action, Reducer};
pub use builder::{BuildError, StoreBuilder};
pub use middleware::{Dispatcher, Middleware, MiddlewareApi, Next};
pub use store::{Disposable, StateStream, Store, SubscribeOptions, WeakStore};
