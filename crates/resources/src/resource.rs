//! `Resource`: a named artifact plus the callbacks that produce it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::location::{FsLocation, Location};
use crate::CallbackError;

/// Requirement identifiers mapped to their resources, handed to every
/// build/update call.
pub type Requirements = BTreeMap<String, Arc<Resource>>;

type CallbackFn =
    dyn Fn(&dyn Location, &Requirements) -> Result<String, CallbackError> + Send + Sync;

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// A shared builder or updater.
///
/// A callback must either leave its location untouched and return an error,
/// or bring the location to the desired state and return a description.
/// Two callbacks are equal when they share the same allocation, so cloning a
/// `Callback` keeps it equal to the original.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Location, &Requirements) -> Result<String, CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// The shared no-op callback, see [`void_callback`].
    pub fn void() -> Self {
        static VOID: OnceLock<Callback> = OnceLock::new();
        VOID.get_or_init(|| Callback::new(void_callback)).clone()
    }

    pub fn call(
        &self,
        location: &dyn Location,
        requirements: &Requirements,
    ) -> Result<String, CallbackError> {
        (self.0)(location, requirements)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Callback for resources that need no build or update step (pre-existing
/// inputs, for instance). Succeeds with an empty description.
pub fn void_callback(
    _location: &dyn Location,
    _requirements: &Requirements,
) -> Result<String, CallbackError> {
    Ok(String::new())
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A uniquely named artifact living at a [`Location`].
///
/// Resources carry no graph knowledge; the engine wires them together.
pub struct Resource {
    identifier: String,
    location: Box<dyn Location>,
    builder: Callback,
    updater: Callback,
}

impl Resource {
    pub fn new(
        location: impl Location,
        identifier: impl Into<String>,
        builder: Callback,
        updater: Callback,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            location: Box::new(location),
            builder,
            updater,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn location(&self) -> &dyn Location {
        self.location.as_ref()
    }

    /// Filesystem path, when the location is an [`FsLocation`].
    pub fn path(&self) -> Option<&Path> {
        self.location
            .downcast_ref::<FsLocation>()
            .map(FsLocation::path)
    }

    pub fn exists(&self) -> bool {
        self.location.exists()
    }

    /// Whether a dependency between `self` and `other` can be checked for
    /// freshness, in both directions.
    pub fn is_comparable_with(&self, other: &Resource) -> bool {
        self.location.is_comparable_with(other.location())
            && other.location.is_comparable_with(self.location())
    }

    pub fn same_location(&self, other: &Resource) -> bool {
        self.location.same_location(other.location())
    }

    /// `self` is at most as fresh as `other`.
    pub fn not_newer_than(&self, other: &Resource) -> bool {
        self.location.not_newer_than(other.location())
    }

    /// `self` is strictly staler than `other`.
    pub fn older_than(&self, other: &Resource) -> bool {
        self.location.older_than(other.location())
    }

    /// Run the builder against this resource's location.
    pub fn build(&self, requirements: &Requirements) -> Result<String, CallbackError> {
        debug!("building '{}' at {}", self.identifier, self.location);
        self.builder.call(self.location(), requirements)
    }

    /// Run the updater against this resource's location.
    pub fn update(&self, requirements: &Requirements) -> Result<String, CallbackError> {
        debug!("updating '{}' at {}", self.identifier, self.location);
        self.updater.call(self.location(), requirements)
    }
}

/// Value equality: same identifier, same location, same callbacks.
impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.location.same_location(other.location())
            && self.builder == other.builder
            && self.updater == other.updater
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("identifier", &self.identifier)
            .field("location", &self.location)
            .field("builder", &self.builder)
            .field("updater", &self.updater)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(path: &str) -> FsLocation {
        FsLocation::new(path).expect("valid path")
    }

    #[test]
    fn void_callback_is_shared() {
        assert_eq!(Callback::void(), Callback::void());
        assert_ne!(Callback::void(), Callback::new(void_callback));
    }

    #[test]
    fn resources_compare_by_value() {
        let builder = Callback::new(|_, _| Ok("built".into()));
        let a = Resource::new(fs("/tmp/a"), "A", builder.clone(), Callback::void());
        let same = Resource::new(fs("/tmp/a"), "A", builder.clone(), Callback::void());
        let other_loc = Resource::new(fs("/tmp/b"), "A", builder, Callback::void());
        let other_cb = Resource::new(fs("/tmp/a"), "A", Callback::void(), Callback::void());

        assert_eq!(a, same);
        assert_ne!(a, other_loc);
        assert_ne!(a, other_cb);
    }

    #[test]
    fn build_forwards_location_and_requirements() {
        let builder = Callback::new(|location, requirements| {
            Ok(format!("{} <- {}", location, requirements.len()))
        });
        let dep = Arc::new(Resource::new(fs("/tmp/dep"), "dep", Callback::void(), Callback::void()));
        let target = Resource::new(fs("/tmp/out"), "out", builder, Callback::void());

        let mut requirements = Requirements::new();
        requirements.insert("dep".into(), dep);

        assert_eq!(target.build(&requirements).unwrap(), "/tmp/out <- 1");
        assert_eq!(target.update(&requirements).unwrap(), "");
    }

    #[test]
    fn failing_callback_surfaces_its_error() {
        let updater = Callback::new(|_, _| Err(CallbackError::failed("disk full")));
        let target = Resource::new(fs("/tmp/out"), "out", Callback::void(), updater);
        let err = target.update(&Requirements::new()).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn path_is_exposed_for_filesystem_locations() {
        let r = Resource::new(fs("/tmp/a"), "A", Callback::void(), Callback::void());
        assert_eq!(r.path(), Some(Path::new("/tmp/a")));
    }
}
