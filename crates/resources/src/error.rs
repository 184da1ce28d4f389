//! Resource-level error types.

use thiserror::Error;

/// Errors returned by a builder or updater callback.
///
/// Any variant tells the engine the callback failed without bringing its
/// location to the desired state; the message is chained onto the engine's
/// `FailedBuild` / `FailedUpdate` record.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The callback gave up with a plain message.
    #[error("{0}")]
    Failed(String),

    /// Reading or writing the location failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the embedding application wants to surface.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Errors raised while constructing a location.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The location can never exist (e.g. an empty filesystem path).
    #[error("bad path '{0}'")]
    BadPath(String),
}
