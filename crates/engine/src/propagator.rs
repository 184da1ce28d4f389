//! Propagation engine.
//!
//! `Propagator` is the central orchestrator:
//! 1. `add` registers resources and the dependency edge between them.
//! 2. `run` checks the graph is acyclic and computes a topological order.
//! 3. Each resource is then built (absent) or updated (staler than one of
//!    its requirements), with every step logged to the history.
//! 4. Errors are collected; the block level decides whether one of them
//!    halts the run early.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use resources::{Requirements, Resource};

use crate::dag::DependencyGraph;
use crate::history::{Event, EventKind, History, Record};
use crate::registry::ResourceRegistry;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How strict a run is about collected errors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum BlockLevel {
    /// Never stop early; process every resource.
    #[default]
    Never = 0,
    /// Stop on any error except `NotPerformedBuild` / `NotPerformedUpdate`.
    OnFailure = 1,
    /// Stop on the first error of any kind.
    OnAnyError = 2,
}

impl BlockLevel {
    /// Whether collecting `error` halts the run at this level.
    pub fn halts_on(self, error: &EngineError) -> bool {
        match self {
            Self::Never => false,
            Self::OnFailure => !error.is_not_performed(),
            Self::OnAnyError => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block level must be 0, 1 or 2, got '{0}'")]
pub struct InvalidBlockLevel(pub String);

impl TryFrom<u8> for BlockLevel {
    type Error = InvalidBlockLevel;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Never),
            1 => Ok(Self::OnFailure),
            2 => Ok(Self::OnAnyError),
            other => Err(InvalidBlockLevel(other.to_string())),
        }
    }
}

impl From<BlockLevel> for u8 {
    fn from(level: BlockLevel) -> Self {
        level as u8
    }
}

impl FromStr for BlockLevel {
    type Err = InvalidBlockLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| InvalidBlockLevel(s.to_owned()))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for BlockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

// ---------------------------------------------------------------------------
// Propagator
// ---------------------------------------------------------------------------

/// Owns the dependency graph, the resource registry and the history of the
/// last run.
///
/// `add` and `run` both take `&mut self`, so there is only ever one active
/// call and no locking is needed.
#[derive(Debug, Default)]
pub struct Propagator {
    graph: DependencyGraph,
    registry: ResourceRegistry,
    history: History,
}

impl Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dependency `requirement → target`: `target` needs
    /// `requirement` to exist and be at least as fresh.
    ///
    /// Adding the same edge twice is harmless. On error neither the graph nor
    /// the registry is modified.
    ///
    /// # Errors
    /// - [`EngineError::NotValidDependency`] if the locations can't be compared.
    /// - [`EngineError::ResourcesIdentifiers`] if an identifier is already
    ///   bound to a different resource.
    /// - [`EngineError::IdentifiersLocation`] if a new identifier reuses a
    ///   registered location.
    pub fn add(
        &mut self,
        requirement: &Arc<Resource>,
        target: &Arc<Resource>,
    ) -> Result<(), EngineError> {
        if !requirement.is_comparable_with(target) {
            return Err(EngineError::NotValidDependency {
                requirement: requirement.identifier().to_owned(),
                target: target.identifier().to_owned(),
            });
        }

        let staged = self.registry.stage(&[requirement, target])?;
        for resource in &staged {
            debug!(
                "registered '{}' at {}",
                resource.identifier(),
                resource.location()
            );
        }
        self.registry.commit(staged);

        if self
            .graph
            .add_edge(requirement.identifier(), target.identifier())
        {
            debug!(
                "dependency '{}' -> '{}' added",
                requirement.identifier(),
                target.identifier()
            );
        }
        Ok(())
    }

    /// Run one propagation pass.
    ///
    /// The history of the previous run is discarded first. Whatever happens,
    /// the history of this run stays readable afterwards.
    ///
    /// # Errors
    /// - [`EngineError::CyclicGraph`] before anything runs, if the graph has
    ///   a cycle.
    /// - [`EngineError::Propagation`] if any error was collected.
    #[instrument(skip(self), fields(resources = self.registry.len()))]
    pub fn run(&mut self, block_level: BlockLevel) -> Result<(), EngineError> {
        self.history.clear();

        let order = self.graph.topological_order()?;
        info!(
            "graph validated: propagating {} resources in order: {:?}",
            order.len(),
            order
        );

        for identifier in &order {
            let mark = self.history.len();
            self.propagate(identifier);

            let halted = self
                .history
                .records_from(mark)
                .filter_map(Record::as_error)
                .any(|err| block_level.halts_on(err));
            if halted {
                error!(
                    "propagation halted at '{}' (block level {})",
                    identifier, block_level
                );
                break;
            }
        }

        let count = self.history.error_count();
        if count > 0 {
            warn!("propagation finished with {} errors", count);
            return Err(EngineError::Propagation { count });
        }

        info!("propagation succeeded ({} history entries)", self.history.len());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Events and errors of the last run, interleaved.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn events(&self) -> Vec<&Event> {
        self.history.events().collect()
    }

    pub fn errors(&self) -> Vec<&EngineError> {
        self.history.errors().collect()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<Resource>> {
        self.registry.get(identifier)
    }

    /// Number of registered resources, i.e. the steps of a full run.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // -----------------------------------------------------------------------
    // Internal: one resource.
    // -----------------------------------------------------------------------

    fn propagate(&mut self, identifier: &str) {
        let Some(target) = self.registry.get(identifier).cloned() else {
            warn!("'{}' is in the graph but not registered", identifier);
            return;
        };

        let declared: Vec<Arc<Resource>> = self
            .graph
            .predecessors(identifier)
            .iter()
            .filter_map(|id| self.registry.get(id).cloned())
            .collect();

        let mut requirements = Requirements::new();
        let mut all_found = true;
        for requirement in &declared {
            if requirement.exists() {
                requirements.insert(requirement.identifier().to_owned(), Arc::clone(requirement));
            } else {
                all_found = false;
                self.record_error(EngineError::NotFoundRequirement {
                    requirement: requirement.identifier().to_owned(),
                    target: identifier.to_owned(),
                });
            }
        }
        if !all_found {
            info!("skipping '{}': requirements missing", identifier);
            return;
        }

        if target.exists() {
            self.update(&target, &declared, &requirements);
        } else {
            self.build(&target, &requirements);
        }
    }

    fn build(&mut self, target: &Resource, requirements: &Requirements) {
        let identifier = target.identifier();
        self.record_event(Event::new(EventKind::LaunchedBuild, identifier));

        match target.build(requirements) {
            Err(cause) => self.record_error(EngineError::failed_build(identifier, &cause)),
            Ok(_) if !target.exists() => self.record_error(EngineError::NotPerformedBuild {
                target: identifier.to_owned(),
            }),
            Ok(description) => self.record_event(
                Event::new(EventKind::PerformedBuild, identifier).with_detail(description),
            ),
        }
    }

    fn update(&mut self, target: &Resource, declared: &[Arc<Resource>], requirements: &Requirements) {
        let identifier = target.identifier();
        let mut performed = None;

        // Only the first requirement at least as fresh as the target triggers
        // the update; the callback still sees every requirement.
        if let Some(trigger) = declared.iter().find(|r| target.not_newer_than(r)) {
            debug!(
                "'{}' is not newer than '{}'",
                identifier,
                trigger.identifier()
            );
            self.record_event(Event::new(EventKind::LaunchedUpdate, identifier));

            match target.update(requirements) {
                Ok(description) => performed = Some(description),
                Err(cause) => {
                    self.record_error(EngineError::failed_update(identifier, &cause));
                    return;
                }
            }
        }

        if let Some(newer) = declared.iter().find(|r| target.older_than(r)) {
            debug!("'{}' is still older than '{}'", identifier, newer.identifier());
            self.record_error(EngineError::NotPerformedUpdate {
                target: identifier.to_owned(),
            });
            return;
        }

        match performed {
            Some(description) => self.record_event(
                Event::new(EventKind::PerformedUpdate, identifier).with_detail(description),
            ),
            None => debug!("'{}' is up to date", identifier),
        }
    }

    fn record_event(&mut self, event: Event) {
        info!("{}", event);
        self.history.push_event(event);
    }

    fn record_error(&mut self, err: EngineError) {
        warn!("{}", err);
        self.history.push_error(err);
    }
}
