//! Built-in builder/updater actions a manifest can ask for.

use std::fs::{self, File};
use std::time::SystemTime;

use serde::Deserialize;
use tracing::debug;

use resources::{Callback, CallbackError, FsLocation, Location};

/// What a resource's builder or updater does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Nothing; for inputs that are never produced by the engine.
    #[default]
    Void,
    /// Create the file if needed and bump its modification time.
    Touch,
    /// Overwrite the file with the content of requirement `from`.
    Copy { from: String },
    /// Always fail with `message`.
    Fail { message: String },
}

impl Action {
    /// Turn the action into a callback for resource `identifier`.
    pub fn into_callback(self, identifier: &str) -> Callback {
        let identifier = identifier.to_owned();
        match self {
            Self::Void => Callback::void(),
            Self::Touch => Callback::new(move |location, _| {
                let file = fs_location(location)?;
                touch(file)?;
                Ok(format!("Touched {identifier}"))
            }),
            Self::Copy { from } => Callback::new(move |location, requirements| {
                let file = fs_location(location)?;
                let source = requirements
                    .get(&from)
                    .and_then(|r| r.path())
                    .ok_or_else(|| {
                        CallbackError::failed(format!("'{from}' is not a file requirement of '{identifier}'"))
                    })?;
                debug!("copying {} into {}", source.display(), file);
                fs::write(file.path(), fs::read(source)?)?;
                Ok(format!("Written {from} in {identifier}"))
            }),
            Self::Fail { message } => Callback::new(move |_, _| Err(CallbackError::failed(message.clone()))),
        }
    }
}

fn fs_location(location: &dyn Location) -> Result<&FsLocation, CallbackError> {
    location
        .downcast_ref::<FsLocation>()
        .ok_or_else(|| CallbackError::failed(format!("{location} is not a file")))
}

fn touch(file: &FsLocation) -> Result<(), CallbackError> {
    if let Some(parent) = file.path().parent() {
        fs::create_dir_all(parent)?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(file.path())?
        .set_modified(SystemTime::now())?;
    Ok(())
}
