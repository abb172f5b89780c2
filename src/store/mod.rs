//! The store and its subscription machinery.
//!
//! # Key Concepts
//!
//! - **Store**: owns the single state value and the composed middleware
//!   chain. Reducer application and subscriber notification run in one
//!   serialized section per store.
//! - **Subscriptions**: each has its own delivery target and optional
//!   distinct-until-changed filter. They are referenced only through a
//!   [`Disposable`] handle, which never keeps the store alive.
//! - **Delivery targets**: [`Immediate`] runs observers on the notifying
//!   thread; [`SerialQueue`] runs them on a dedicated thread in order.
//!
//! # Example
//!
//! ```rust
//! use unistore::core::{Action, Reducer};
//! use unistore::store::{SerialQueue, Store, SubscribeOptions};
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Set(u8);
//!
//! impl Action for Set {}
//!
//! let store = Store::new(0u8, Reducer::new(|a: &Set, _s: u8| a.0), Vec::new());
//! let (tx, rx) = mpsc::channel();
//! let _sub = store.subscribe_with(
//!     SubscribeOptions::new()
//!         .on(SerialQueue::new("observer").unwrap())
//!         .skip_repeats(),
//!     move |state| tx.send(state).unwrap(),
//! );
//!
//! for n in [1, 1, 2] {
//!     store.dispatch(Set(n));
//! }
//!
//! let timeout = Duration::from_secs(5);
//! assert_eq!(rx.recv_timeout(timeout).unwrap(), 1);
//! assert_eq!(rx.recv_timeout(timeout).unwrap(), 2);
//! ```

mod cell;
mod disposable;
mod error;
mod options;
mod registry;
mod serial;
#[allow(clippy::module_inception)]
mod store;
mod stream;
pub mod target;

pub(crate) use cell::StateCell;
pub(crate) use registry::RegistryConfig;

pub use disposable::{Disposable, SubscriptionId};
pub use error::{SubscribeError, TargetError};
pub use options::{Equality, MissingEqualityPolicy, SubscribeOptions};
pub use store::{Store, WeakStore};
pub use stream::{StateReceiver, StateStream};
pub use target::{DeliveryTarget, FnTarget, Immediate, Job, SerialQueue};
