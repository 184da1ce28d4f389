//! Resource registry: identifier → `Resource`, with the uniqueness rules
//! checked when a dependency is added.

use std::collections::HashMap;
use std::sync::Arc;

use resources::Resource;

use crate::EngineError;

/// Maps identifiers to registered resources.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<Resource>> {
        self.resources.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.resources.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Validate `candidates` in order without touching the registry and
    /// return the ones that still need registering.
    ///
    /// A candidate whose identifier is already known (on record, or earlier
    /// in `candidates`) must be the same resource. A new identifier must not
    /// share its location with any other resource.
    ///
    /// # Errors
    /// - [`EngineError::ResourcesIdentifiers`] on an identifier clash.
    /// - [`EngineError::IdentifiersLocation`] on a location clash.
    pub fn stage(&self, candidates: &[&Arc<Resource>]) -> Result<Vec<Arc<Resource>>, EngineError> {
        let mut staged: Vec<Arc<Resource>> = Vec::new();

        for &candidate in candidates {
            let identifier = candidate.identifier();
            let known = self
                .resources
                .get(identifier)
                .or_else(|| staged.iter().find(|r| r.identifier() == identifier));

            match known {
                Some(existing) => {
                    if !same_resource(existing, candidate) {
                        return Err(EngineError::ResourcesIdentifiers {
                            identifier: identifier.to_owned(),
                        });
                    }
                }
                None => {
                    let clash = self
                        .resources
                        .values()
                        .chain(staged.iter())
                        .find(|r| r.same_location(candidate));
                    if let Some(existing) = clash {
                        return Err(EngineError::IdentifiersLocation {
                            identifier: identifier.to_owned(),
                            existing: existing.identifier().to_owned(),
                            location: candidate.location().to_string(),
                        });
                    }
                    staged.push(Arc::clone(candidate));
                }
            }
        }

        Ok(staged)
    }

    /// Register resources previously returned by [`stage`](Self::stage).
    pub fn commit(&mut self, staged: Vec<Arc<Resource>>) {
        for resource in staged {
            self.resources
                .insert(resource.identifier().to_owned(), resource);
        }
    }
}

fn same_resource(a: &Arc<Resource>, b: &Arc<Resource>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
