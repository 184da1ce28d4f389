//! Test doubles: `MockLocation` and `MockCallback`.
//!
//! `MockLocation` is a second `Location` realization driven by a logical
//! clock instead of the filesystem, which keeps freshness comparisons exact
//! in tests. `MockCallback` records every call and does whatever it was told
//! at construction time.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::location::Location;
use crate::resource::Callback;
use crate::CallbackError;

// ---------------------------------------------------------------------------
// MockLocation
// ---------------------------------------------------------------------------

/// An in-memory location. Clones share state, so a test can keep a handle
/// and inspect or alter the artifact after handing a clone to a `Resource`.
#[derive(Debug, Clone)]
pub struct MockLocation {
    name: String,
    stamp: Arc<Mutex<Option<u64>>>,
}

impl MockLocation {
    /// A location whose artifact does not exist yet.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stamp: Arc::new(Mutex::new(None)),
        }
    }

    /// A location whose artifact exists with modification stamp `stamp`.
    pub fn at(name: impl Into<String>, stamp: u64) -> Self {
        let location = Self::absent(name);
        location.touch(stamp);
        location
    }

    /// Create or refresh the artifact.
    pub fn touch(&self, stamp: u64) {
        *self.stamp.lock().unwrap() = Some(stamp);
    }

    pub fn stamp(&self) -> Option<u64> {
        *self.stamp.lock().unwrap()
    }

    fn compare_with(&self, other: &dyn Location, cmp: impl FnOnce(u64, u64) -> bool) -> bool {
        let Some(other) = other.downcast_ref::<MockLocation>() else {
            return false;
        };
        match (self.stamp(), other.stamp()) {
            (Some(mine), Some(theirs)) => cmp(mine, theirs),
            _ => false,
        }
    }
}

impl fmt::Display for MockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock://{}", self.name)
    }
}

impl Location for MockLocation {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn exists(&self) -> bool {
        self.stamp().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_location(&self, other: &dyn Location) -> bool {
        other
            .downcast_ref::<MockLocation>()
            .is_some_and(|other| other.name == self.name)
    }

    fn not_newer_than(&self, other: &dyn Location) -> bool {
        self.compare_with(other, |mine, theirs| mine <= theirs)
    }

    fn older_than(&self, other: &dyn Location) -> bool {
        self.compare_with(other, |mine, theirs| mine < theirs)
    }
}

// ---------------------------------------------------------------------------
// MockCallback
// ---------------------------------------------------------------------------

/// Behaviour injected into `MockCallback` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Stamp the location (which must be a `MockLocation`) and succeed.
    Touch { stamp: u64, description: String },
    /// Succeed without touching anything.
    Noop,
    /// Fail with the given message.
    Fail(String),
}

/// A callback that records the requirement identifiers of every call.
#[derive(Debug, Clone)]
pub struct MockCallback {
    behaviour: MockBehaviour,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockCallback {
    /// Stamp the location with `stamp` and return `description`.
    pub fn touching(stamp: u64, description: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Touch {
            stamp,
            description: description.into(),
        })
    }

    /// Return successfully without doing anything.
    pub fn noop() -> Self {
        Self::with(MockBehaviour::Noop)
    }

    /// Always fail with `msg`.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Fail(msg.into()))
    }

    fn with(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The `Callback` to hand to a `Resource`. Every callback obtained from
    /// the same mock shares its call log.
    pub fn callback(&self) -> Callback {
        let behaviour = self.behaviour.clone();
        let calls = Arc::clone(&self.calls);
        Callback::new(move |location, requirements| {
            calls
                .lock()
                .unwrap()
                .push(requirements.keys().cloned().collect());
            match &behaviour {
                MockBehaviour::Touch { stamp, description } => {
                    let mock = location.downcast_ref::<MockLocation>().ok_or_else(|| {
                        CallbackError::failed(format!("{location} is not a mock location"))
                    })?;
                    mock.touch(*stamp);
                    Ok(description.clone())
                }
                MockBehaviour::Noop => Ok(String::new()),
                MockBehaviour::Fail(msg) => Err(CallbackError::failed(msg.clone())),
            }
        })
    }

    /// Number of times this callback has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requirement identifiers seen by each call, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}
