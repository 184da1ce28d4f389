//! Engine-level error types.
//!
//! One closed taxonomy covers both the errors `add` raises immediately and
//! the ones `run` collects into the history.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use resources::{CallbackError, LocationError};

/// Tag of an [`EngineError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadPath,
    NotValidDependency,
    ResourcesIdentifiers,
    IdentifiersLocation,
    CyclicGraph,
    FailedBuild,
    NotPerformedBuild,
    NotFoundRequirement,
    FailedUpdate,
    NotPerformedUpdate,
    Propagation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Errors produced by the propagation engine (registration + propagation).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    // ------ Registration errors ------

    /// The location can never exist.
    #[error("bad path '{location}'")]
    BadPath { location: String },

    /// The two locations cannot be compared for freshness.
    #[error("dependency between '{requirement}' and '{target}' is not valid")]
    NotValidDependency { requirement: String, target: String },

    /// An identifier already on record was supplied with a different resource.
    #[error("more resources have the same identifier '{identifier}'")]
    ResourcesIdentifiers { identifier: String },

    /// A new identifier points at a location another resource already owns.
    #[error("resources '{identifier}' and '{existing}' point to the same location '{location}'")]
    IdentifiersLocation {
        identifier: String,
        existing: String,
        location: String,
    },

    // ------ Propagation errors ------

    #[error("found cyclic dependencies")]
    CyclicGraph,

    #[error("build of '{target}' failed, build callback returned an error -> {cause}")]
    FailedBuild { target: String, cause: String },

    #[error("build of '{target}' hasn't been really performed (build callback hasn't built anything)")]
    NotPerformedBuild { target: String },

    #[error("requirement '{requirement}' for '{target}' doesn't exist, update is not possible")]
    NotFoundRequirement { requirement: String, target: String },

    #[error("update of '{target}' failed, update callback returned an error -> {cause}")]
    FailedUpdate { target: String, cause: String },

    #[error("update of '{target}' hasn't been really performed (update callback hasn't updated anything)")]
    NotPerformedUpdate { target: String },

    /// Returned by `run` when at least one error was collected.
    #[error("'{count}' errors have been detected during propagation")]
    Propagation { count: usize },
}

impl EngineError {
    /// `FailedBuild` chained with the callback's own error.
    pub fn failed_build(target: impl Into<String>, cause: &CallbackError) -> Self {
        Self::FailedBuild {
            target: target.into(),
            cause: cause.to_string(),
        }
    }

    /// `FailedUpdate` chained with the callback's own error.
    pub fn failed_update(target: impl Into<String>, cause: &CallbackError) -> Self {
        Self::FailedUpdate {
            target: target.into(),
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadPath { .. } => ErrorKind::BadPath,
            Self::NotValidDependency { .. } => ErrorKind::NotValidDependency,
            Self::ResourcesIdentifiers { .. } => ErrorKind::ResourcesIdentifiers,
            Self::IdentifiersLocation { .. } => ErrorKind::IdentifiersLocation,
            Self::CyclicGraph => ErrorKind::CyclicGraph,
            Self::FailedBuild { .. } => ErrorKind::FailedBuild,
            Self::NotPerformedBuild { .. } => ErrorKind::NotPerformedBuild,
            Self::NotFoundRequirement { .. } => ErrorKind::NotFoundRequirement,
            Self::FailedUpdate { .. } => ErrorKind::FailedUpdate,
            Self::NotPerformedUpdate { .. } => ErrorKind::NotPerformedUpdate,
            Self::Propagation { .. } => ErrorKind::Propagation,
        }
    }

    /// A callback returned normally but left its location untouched.
    pub fn is_not_performed(&self) -> bool {
        matches!(
            self,
            Self::NotPerformedBuild { .. } | Self::NotPerformedUpdate { .. }
        )
    }
}

impl From<LocationError> for EngineError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::BadPath(location) => Self::BadPath { location },
        }
    }
}
