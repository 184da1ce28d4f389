//! The `Location` capability: where a resource lives.
//!
//! The engine only ever talks to `dyn Location`, so new kinds (object store
//! keys, database rows, ...) can be plugged in without touching propagation
//! logic. Freshness comparisons are only meaningful between comparable kinds;
//! the engine rejects incompatible pairs when a dependency is registered.

use std::any::Any;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::LocationError;

/// Capability every resource location must provide.
pub trait Location: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Short tag naming the location kind, e.g. `"fs"`.
    fn kind(&self) -> &'static str;

    /// Whether the underlying artifact is currently present.
    fn exists(&self) -> bool;

    /// Upcast used by `<dyn Location>::downcast_ref`.
    fn as_any(&self) -> &dyn Any;

    /// Whether freshness of `self` and `other` can be compared.
    fn is_comparable_with(&self, other: &dyn Location) -> bool {
        self.kind() == other.kind()
    }

    /// Whether `self` and `other` designate the same artifact.
    fn same_location(&self, other: &dyn Location) -> bool;

    /// `self` was last modified at or before `other`.
    fn not_newer_than(&self, other: &dyn Location) -> bool;

    /// `self` was last modified strictly before `other`.
    fn older_than(&self, other: &dyn Location) -> bool;
}

impl dyn Location {
    /// Recover the concrete location kind.
    pub fn downcast_ref<T: Location>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

// ---------------------------------------------------------------------------
// Filesystem realization
// ---------------------------------------------------------------------------

/// A location backed by a filesystem path, compared by modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FsLocation {
    path: PathBuf,
}

impl FsLocation {
    /// Wrap `path`.
    ///
    /// # Errors
    /// [`LocationError::BadPath`] if the path is empty.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LocationError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(LocationError::BadPath(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time of the path itself (symlinks are not followed).
    pub fn modified(&self) -> Option<SystemTime> {
        fs::symlink_metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
    }

    fn compare_with(
        &self,
        other: &dyn Location,
        cmp: impl FnOnce(SystemTime, SystemTime) -> bool,
    ) -> bool {
        let Some(other) = other.downcast_ref::<FsLocation>() else {
            return false;
        };
        match (self.modified(), other.modified()) {
            (Some(mine), Some(theirs)) => cmp(mine, theirs),
            _ => false,
        }
    }
}

impl fmt::Display for FsLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl Location for FsLocation {
    fn kind(&self) -> &'static str {
        "fs"
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_location(&self, other: &dyn Location) -> bool {
        other
            .downcast_ref::<FsLocation>()
            .is_some_and(|other| other.path == self.path)
    }

    fn not_newer_than(&self, other: &dyn Location) -> bool {
        self.compare_with(other, |mine, theirs| mine <= theirs)
    }

    fn older_than(&self, other: &dyn Location) -> bool {
        self.compare_with(other, |mine, theirs| mine < theirs)
    }
}
