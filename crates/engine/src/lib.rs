//! `engine` crate: dependency graph, resource registry, history and the
//! propagation engine.

pub mod error;
pub mod dag;
pub mod registry;
pub mod history;
pub mod propagator;

pub use error::{EngineError, ErrorKind};
pub use dag::DependencyGraph;
pub use registry::ResourceRegistry;
pub use history::{Entry, Event, EventKind, History, Record};
pub use propagator::{BlockLevel, InvalidBlockLevel, Propagator};
