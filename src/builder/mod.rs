//! Builder API for ergonomic store construction.
//!
//! This module provides a fluent builder for configuring a store and a
//! macro for declaring action enums with minimal boilerplate.

pub mod error;
pub mod macros;
pub mod store;

pub use error::BuildError;
pub use store::StoreBuilder;
