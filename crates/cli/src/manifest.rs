//! JSON manifest describing file resources and their dependencies.
//!
//! ```json
//! {
//!   "resources": [
//!     { "id": "A", "path": "a.txt" },
//!     { "id": "C", "path": "c.txt", "update": { "action": "copy", "from": "A" } }
//!   ],
//!   "dependencies": [ { "requirement": "A", "target": "C" } ]
//! }
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use engine::{EngineError, Propagator};
use resources::{FsLocation, Resource};

use crate::actions::Action;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("resource '{0}' is declared more than once")]
    DuplicateResource(String),

    #[error("dependency references unknown resource '{0}'")]
    UnknownResource(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    pub id: String,
    pub path: PathBuf,
    #[serde(default)]
    pub build: Action,
    #[serde(default)]
    pub update: Action,
}

/// `target` needs `requirement`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    pub requirement: String,
    pub target: String,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build the resources and register every dependency.
    ///
    /// Resources that appear in no dependency are never registered and are
    /// reported with a warning.
    pub fn into_propagator(self, base_dir: &Path) -> Result<Propagator, ManifestError> {
        let mut built: HashMap<String, Arc<Resource>> = HashMap::new();
        for spec in self.resources {
            if built.contains_key(&spec.id) {
                return Err(ManifestError::DuplicateResource(spec.id));
            }
            // An empty path would otherwise resolve to the manifest directory.
            let location = FsLocation::new(&spec.path)
                .and_then(|relative| FsLocation::new(base_dir.join(relative.path())))
                .map_err(EngineError::from)?;
            let resource = Resource::new(
                location,
                spec.id.clone(),
                spec.build.into_callback(&spec.id),
                spec.update.into_callback(&spec.id),
            );
            built.insert(spec.id, Arc::new(resource));
        }

        let lookup = |id: &str| {
            built
                .get(id)
                .ok_or_else(|| ManifestError::UnknownResource(id.to_owned()))
        };

        let mut propagator = Propagator::new();
        for dep in &self.dependencies {
            let requirement = lookup(&dep.requirement)?;
            let target = lookup(&dep.target)?;
            propagator.add(requirement, target)?;
        }

        for id in built.keys().filter(|id| propagator.get(id).is_none()) {
            warn!("resource '{}' has no dependency and will not be processed", id);
        }
        info!(
            "loaded {} resources and {} dependencies",
            propagator.len(),
            propagator.graph().edge_count()
        );
        Ok(propagator)
    }
}
