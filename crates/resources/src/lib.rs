//! `resources` crate: the `Location` capability, the `Resource` type and
//! the callback contract.
//!
//! A resource knows where it lives and how to build or update itself; it
//! knows nothing about its dependencies. The engine crate wires resources
//! into a graph and decides which callback to run.

pub mod error;
pub mod location;
pub mod resource;
pub mod mock;

pub use error::{CallbackError, LocationError};
pub use location::{FsLocation, Location};
pub use resource::{void_callback, Callback, Requirements, Resource};
