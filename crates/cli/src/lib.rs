//! Library half of the `propagator` binary: manifest loading, built-in
//! file actions and history rendering.

pub mod actions;
pub mod manifest;
pub mod report;

pub use actions::Action;
pub use manifest::{Manifest, ManifestError};
